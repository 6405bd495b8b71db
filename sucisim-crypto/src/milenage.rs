//! Milenage authentication and key generation algorithm set (3GPP TS 35.206)
//!
//! Milenage is the AES-128-based function family behind UMTS/LTE/5G
//! authentication and key agreement:
//! - f1 / f1*: network authentication MAC-A and resynchronization MAC-S
//! - f2: user authentication response RES
//! - f3: cipher key CK
//! - f4: integrity key IK
//! - f5 / f5*: anonymity keys AK
//!
//! Every function shares one block shape,
//! `E_K(rot(X, r) XOR c) XOR OPc`, differing only in the rotation amount
//! `r` and the 16-byte constant `c`. All rotation amounts are multiples of
//! 8 bits, so rotation reduces to a byte rotation.
//!
//! Outputs are fully determined by the inputs; the engine holds no session
//! state and never touches a random number generator. Conformance is pinned
//! by the 3GPP TS 35.207 test sets below.

use crate::aes::{xor_block, Aes128Block, BLOCK_SIZE};

/// Subscriber key size in bytes (128 bits)
pub const KEY_SIZE: usize = 16;

/// OP/OPc size in bytes (128 bits)
pub const OP_SIZE: usize = 16;

/// RAND size in bytes (128 bits)
pub const RAND_SIZE: usize = 16;

/// SQN size in bytes (48 bits)
pub const SQN_SIZE: usize = 6;

/// AMF size in bytes (16 bits)
pub const AMF_SIZE: usize = 2;

/// MAC-A/MAC-S size in bytes (64 bits)
pub const MAC_SIZE: usize = 8;

/// RES size in bytes (64 bits)
pub const RES_SIZE: usize = 8;

/// CK size in bytes (128 bits)
pub const CK_SIZE: usize = 16;

/// IK size in bytes (128 bits)
pub const IK_SIZE: usize = 16;

/// AK size in bytes (48 bits)
pub const AK_SIZE: usize = 6;

/// Per-function XOR constants c1..c5: all zero except the last byte,
/// set to 0, 1, 2, 4, 8 respectively.
const C1: [u8; BLOCK_SIZE] = block_constant(0x00);
const C2: [u8; BLOCK_SIZE] = block_constant(0x01);
const C3: [u8; BLOCK_SIZE] = block_constant(0x02);
const C4: [u8; BLOCK_SIZE] = block_constant(0x04);
const C5: [u8; BLOCK_SIZE] = block_constant(0x08);

/// Per-function rotation amounts in bits.
const R1: usize = 64;
const R2: usize = 0;
const R3: usize = 32;
const R4: usize = 64;
const R5: usize = 96;

const fn block_constant(last: u8) -> [u8; BLOCK_SIZE] {
    let mut c = [0u8; BLOCK_SIZE];
    c[BLOCK_SIZE - 1] = last;
    c
}

/// Cyclic left rotation of a 128-bit block. `bits` must be a multiple of 8.
fn rotate_left(block: &[u8; BLOCK_SIZE], bits: usize) -> [u8; BLOCK_SIZE] {
    let shift = (bits / 8) % BLOCK_SIZE;
    if shift == 0 {
        return *block;
    }
    let mut result = [0u8; BLOCK_SIZE];
    for (i, out) in result.iter_mut().enumerate() {
        *out = block[(i + shift) % BLOCK_SIZE];
    }
    result
}

/// Compute OPc from K and OP: `OPc = OP XOR E_K(OP)`.
pub fn compute_opc(k: &[u8; KEY_SIZE], op: &[u8; OP_SIZE]) -> [u8; OP_SIZE] {
    let mut opc = Aes128Block::new(k).encrypt_block_copy(op);
    xor_block(&mut opc, op);
    opc
}

/// The complete output of one Milenage run.
///
/// Re-running with identical inputs yields byte-identical outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthVector {
    /// MAC-A from f1 (network authentication code)
    pub mac_a: [u8; MAC_SIZE],
    /// RES from f2 (expected user response)
    pub res: [u8; RES_SIZE],
    /// CK from f3 (cipher key)
    pub ck: [u8; CK_SIZE],
    /// IK from f4 (integrity key)
    pub ik: [u8; IK_SIZE],
    /// AK from f5 (anonymity key)
    pub ak: [u8; AK_SIZE],
}

/// Milenage context holding the AES key schedule and OPc.
pub struct Milenage {
    cipher: Aes128Block,
    opc: [u8; OP_SIZE],
}

impl Milenage {
    /// Create a Milenage instance from K and a pre-computed OPc.
    pub fn new(k: &[u8; KEY_SIZE], opc: &[u8; OP_SIZE]) -> Self {
        Self {
            cipher: Aes128Block::new(k),
            opc: *opc,
        }
    }

    /// Create a Milenage instance from K and OP, deriving OPc internally.
    pub fn new_with_op(k: &[u8; KEY_SIZE], op: &[u8; OP_SIZE]) -> Self {
        let opc = compute_opc(k, op);
        Self::new(k, &opc)
    }

    /// `TEMP = E_K(RAND XOR OPc)`, shared by every function.
    fn temp(&self, rand: &[u8; RAND_SIZE]) -> [u8; BLOCK_SIZE] {
        let mut block = *rand;
        xor_block(&mut block, &self.opc);
        self.cipher.encrypt_block(&mut block);
        block
    }

    /// OUT1 for f1/f1*:
    /// `E_K(TEMP XOR rot(IN1 XOR OPc, r1) XOR c1) XOR OPc`
    /// with `IN1 = SQN || AMF || SQN || AMF`.
    fn out1(
        &self,
        rand: &[u8; RAND_SIZE],
        sqn: &[u8; SQN_SIZE],
        amf: &[u8; AMF_SIZE],
    ) -> [u8; BLOCK_SIZE] {
        let mut in1 = [0u8; BLOCK_SIZE];
        in1[0..6].copy_from_slice(sqn);
        in1[6..8].copy_from_slice(amf);
        in1[8..14].copy_from_slice(sqn);
        in1[14..16].copy_from_slice(amf);
        xor_block(&mut in1, &self.opc);

        let mut block = rotate_left(&in1, R1);
        xor_block(&mut block, &self.temp(rand));
        xor_block(&mut block, &C1);
        self.cipher.encrypt_block(&mut block);
        xor_block(&mut block, &self.opc);
        block
    }

    /// OUT2..OUT5 share one shape:
    /// `E_K(rot(TEMP XOR OPc, r) XOR c) XOR OPc`.
    fn out_block(&self, rand: &[u8; RAND_SIZE], r: usize, c: &[u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
        let mut m = self.temp(rand);
        xor_block(&mut m, &self.opc);

        let mut block = rotate_left(&m, r);
        xor_block(&mut block, c);
        self.cipher.encrypt_block(&mut block);
        xor_block(&mut block, &self.opc);
        block
    }

    /// f1: MAC-A, the first 8 bytes of OUT1.
    pub fn f1(
        &self,
        rand: &[u8; RAND_SIZE],
        sqn: &[u8; SQN_SIZE],
        amf: &[u8; AMF_SIZE],
    ) -> [u8; MAC_SIZE] {
        let out1 = self.out1(rand, sqn, amf);
        out1[..MAC_SIZE].try_into().expect("OUT1 is 16 bytes")
    }

    /// f1*: MAC-S for resynchronization, the last 8 bytes of OUT1.
    pub fn f1_star(
        &self,
        rand: &[u8; RAND_SIZE],
        sqn: &[u8; SQN_SIZE],
        amf: &[u8; AMF_SIZE],
    ) -> [u8; MAC_SIZE] {
        let out1 = self.out1(rand, sqn, amf);
        out1[MAC_SIZE..].try_into().expect("OUT1 is 16 bytes")
    }

    /// f2: RES, bytes 8..16 of the OUT2 block.
    pub fn f2(&self, rand: &[u8; RAND_SIZE]) -> [u8; RES_SIZE] {
        let out2 = self.out_block(rand, R2, &C2);
        out2[8..16].try_into().expect("OUT2 is 16 bytes")
    }

    /// f3: CK, the full OUT3 block.
    pub fn f3(&self, rand: &[u8; RAND_SIZE]) -> [u8; CK_SIZE] {
        self.out_block(rand, R3, &C3)
    }

    /// f4: IK, the full OUT4 block.
    pub fn f4(&self, rand: &[u8; RAND_SIZE]) -> [u8; IK_SIZE] {
        self.out_block(rand, R4, &C4)
    }

    /// f5: AK, bytes 0..6 of the OUT2 block (shared with f2).
    pub fn f5(&self, rand: &[u8; RAND_SIZE]) -> [u8; AK_SIZE] {
        let out2 = self.out_block(rand, R2, &C2);
        out2[..AK_SIZE].try_into().expect("OUT2 is 16 bytes")
    }

    /// f5*: resynchronization AK, bytes 0..6 of OUT5.
    pub fn f5_star(&self, rand: &[u8; RAND_SIZE]) -> [u8; AK_SIZE] {
        let out5 = self.out_block(rand, R5, &C5);
        out5[..AK_SIZE].try_into().expect("OUT5 is 16 bytes")
    }

    /// Compute MAC-A, RES, CK, IK and AK in one call.
    pub fn compute(
        &self,
        rand: &[u8; RAND_SIZE],
        sqn: &[u8; SQN_SIZE],
        amf: &[u8; AMF_SIZE],
    ) -> AuthVector {
        let out2 = self.out_block(rand, R2, &C2);
        AuthVector {
            mac_a: self.f1(rand, sqn, amf),
            res: out2[8..16].try_into().expect("OUT2 is 16 bytes"),
            ck: self.f3(rand),
            ik: self.f4(rand),
            ak: out2[..AK_SIZE].try_into().expect("OUT2 is 16 bytes"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hx<const N: usize>(s: &str) -> [u8; N] {
        hex::decode(s).unwrap().try_into().unwrap()
    }

    struct TestSet {
        k: &'static str,
        rand: &'static str,
        sqn: &'static str,
        amf: &'static str,
        op: &'static str,
        opc: &'static str,
        f1: &'static str,
        f1_star: &'static str,
        f2: &'static str,
        f3: &'static str,
        f4: &'static str,
        f5: &'static str,
        f5_star: &'static str,
    }

    /// 3GPP TS 35.207 test sets.
    const TEST_SETS: &[TestSet] = &[
        // Test Set 1
        TestSet {
            k: "465b5ce8b199b49faa5f0a2ee238a6bc",
            rand: "23553cbe9637a89d218ae64dae47bf35",
            sqn: "ff9bb4d0b607",
            amf: "b9b9",
            op: "cdc202d5123e20f62b6d676ac72cb318",
            opc: "cd63cb71954a9f4e48a5994e37a02baf",
            f1: "4a9ffac354dfafb3",
            f1_star: "01cfaf9ec4e871e9",
            f2: "a54211d5e3ba50bf",
            f3: "b40ba9a3c58b2a05bbf0d987b21bf8cb",
            f4: "f769bcd751044604127672711c6d3441",
            f5: "aa689c648370",
            f5_star: "451e8beca43b",
        },
        // Test Set 3
        TestSet {
            k: "fec86ba6eb707ed08905757b1bb44b8f",
            rand: "9f7c8d021accf4db213ccff0c7f71a6a",
            sqn: "9d0277595ffc",
            amf: "725c",
            op: "dbc59adcb6f9a0ef735477b7fadf8374",
            opc: "1006020f0a478bf6b699f15c062e42b3",
            f1: "9cabc3e99baf7281",
            f1_star: "95814ba2b3044324",
            f2: "8011c48c0c214ed2",
            f3: "5dbdbb2954e8f3cde665b046179a5098",
            f4: "59a92d3b476a0443487055cf88b2307b",
            f5: "33484dc2136b",
            f5_star: "deacdd848cc6",
        },
        // Test Set 6
        TestSet {
            k: "6c38a116ac280c454f59332ee35c8c4f",
            rand: "ee6466bc96202c5a557abbeff8babf63",
            sqn: "414b98222181",
            amf: "4464",
            op: "1ba00a1a7c6700ac8c3ff3e96ad08725",
            opc: "3803ef5363b947c6aaa225e58fae3934",
            f1: "078adfb488241a57",
            f1_star: "80246b8d0186bcf1",
            f2: "16c8233f05a0ac28",
            f3: "3f8c7587fe8e4b233af676aede30ba3b",
            f4: "a7466cc1e6b2a1337d49d3b66e95d7b4",
            f5: "45b0f69ab06c",
            f5_star: "1f53cd2b1113",
        },
    ];

    #[test]
    fn test_3gpp_conformance_sets() {
        for set in TEST_SETS {
            let k: [u8; 16] = hx(set.k);
            let rand: [u8; 16] = hx(set.rand);
            let sqn: [u8; 6] = hx(set.sqn);
            let amf: [u8; 2] = hx(set.amf);
            let op: [u8; 16] = hx(set.op);

            let opc = compute_opc(&k, &op);
            assert_eq!(opc, hx::<16>(set.opc), "OPc mismatch");

            let m = Milenage::new(&k, &opc);
            assert_eq!(m.f1(&rand, &sqn, &amf), hx::<8>(set.f1), "f1 mismatch");
            assert_eq!(
                m.f1_star(&rand, &sqn, &amf),
                hx::<8>(set.f1_star),
                "f1* mismatch"
            );
            assert_eq!(m.f2(&rand), hx::<8>(set.f2), "f2 mismatch");
            assert_eq!(m.f3(&rand), hx::<16>(set.f3), "f3 mismatch");
            assert_eq!(m.f4(&rand), hx::<16>(set.f4), "f4 mismatch");
            assert_eq!(m.f5(&rand), hx::<6>(set.f5), "f5 mismatch");
            assert_eq!(m.f5_star(&rand), hx::<6>(set.f5_star), "f5* mismatch");
        }
    }

    #[test]
    fn test_compute_matches_individual_functions() {
        let set = &TEST_SETS[0];
        let k: [u8; 16] = hx(set.k);
        let rand: [u8; 16] = hx(set.rand);
        let sqn: [u8; 6] = hx(set.sqn);
        let amf: [u8; 2] = hx(set.amf);

        let m = Milenage::new_with_op(&k, &hx::<16>(set.op));
        let vector = m.compute(&rand, &sqn, &amf);

        assert_eq!(vector.mac_a, hx::<8>(set.f1));
        assert_eq!(vector.res, hx::<8>(set.f2));
        assert_eq!(vector.ck, hx::<16>(set.f3));
        assert_eq!(vector.ik, hx::<16>(set.f4));
        assert_eq!(vector.ak, hx::<6>(set.f5));
    }

    #[test]
    fn test_compute_is_deterministic() {
        let k = [0x42u8; 16];
        let opc = [0x17u8; 16];
        let rand = [0xa5u8; 16];
        let sqn = [0x01u8; 6];
        let amf = [0x80, 0x00];

        let m = Milenage::new(&k, &opc);
        assert_eq!(m.compute(&rand, &sqn, &amf), m.compute(&rand, &sqn, &amf));
    }

    #[test]
    fn test_rotate_left() {
        let block: [u8; 16] = [
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
            0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f, 0x10,
        ];

        assert_eq!(rotate_left(&block, 0), block);

        let rotated_64 = rotate_left(&block, 64);
        assert_eq!(rotated_64[0], 0x09);
        assert_eq!(rotated_64[8], 0x01);

        let rotated_32 = rotate_left(&block, 32);
        assert_eq!(rotated_32[0], 0x05);
        assert_eq!(rotated_32[12], 0x01);
    }
}
