//! Structural hash of a genome's active subtree (§4.3). Two genomes whose active code is
//! byte-for-byte identical after packing share a [`Signature`] even when their intron content
//! (everything outside the reachable-from-`best` subtree) differs.
use crate::{Gene, Genome, Locus};
use mep_ops::{Primitive, SymbolSet};

/// 128-bit structural hash. `Default`/`0,0` is reserved as the "empty" sentinel — a genome is
/// never packed to the all-zero stream in practice, since every active subtree packs at least
/// one opcode.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Signature(pub u64, pub u64);

impl Signature {
    pub fn is_empty(&self) -> bool {
        self.0 == 0 && self.1 == 0
    }
}

fn pack_locus(genome: &Genome, sset: &SymbolSet, locus: Locus, buf: &mut Vec<u8>) {
    let gene: &Gene = genome.gene(locus);
    let prim = sset
        .decode_opcode(gene.opcode)
        .expect("gene opcode must resolve against the genome's symbol set");

    buf.extend_from_slice(&(gene.opcode.0 as u16).to_le_bytes());

    match prim {
        Primitive::Fn { .. } => {
            for (i, &arg_index) in gene.args.iter().enumerate() {
                let arg_category = prim
                    .arg_category(i)
                    .expect("function gene's arity must match its declared argument categories");
                pack_locus(genome, sset, Locus::new(arg_index, arg_category), buf);
            }
        }
        Primitive::Ephemeral { .. } => {
            buf.extend_from_slice(&gene.param.to_le_bytes());
        }
        Primitive::Var { .. } | Primitive::Const { .. } => {}
    }
}

/// Packs the genome's active subtree (starting at `best`) into a flat byte stream, in the
/// deterministic order described by §4.3: opcode, then (parametric terminal) raw parameter
/// bytes, then each argument's packed subtree, recursively. Introns are never visited.
pub fn pack(genome: &Genome, sset: &SymbolSet) -> Vec<u8> {
    let mut buf = Vec::new();
    pack_locus(genome, sset, genome.best(), &mut buf);
    buf
}

/// Computes the genome's signature by hashing its packed active subtree with a 128-bit
/// MurmurHash3 (x64 variant).
pub fn signature_of(genome: &Genome, sset: &SymbolSet) -> Signature {
    let packed = pack(genome, sset);
    murmurhash3_x64_128(&packed, 1973)
}

#[inline]
fn rotl64(x: u64, r: u32) -> u64 {
    x.rotate_left(r)
}

#[inline]
fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51afd7ed558ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ceb9fe1a85ec53);
    k ^= k >> 33;
    k
}

/// MurmurHash3 x64 128-bit (Austin Appleby's public-domain reference algorithm).
pub fn murmurhash3_x64_128(data: &[u8], seed: u32) -> Signature {
    const C1: u64 = 0x87c3_7b91_1142_53d5;
    const C2: u64 = 0x4cf5_ad43_2745_937f;

    let len = data.len();
    let n_blocks = len / 16;

    let mut h1 = seed as u64;
    let mut h2 = seed as u64;

    for i in 0..n_blocks {
        let off = i * 16;
        let mut k1 = u64::from_le_bytes(data[off..off + 8].try_into().unwrap());
        let mut k2 = u64::from_le_bytes(data[off + 8..off + 16].try_into().unwrap());

        k1 = k1.wrapping_mul(C1);
        k1 = rotl64(k1, 31);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;

        h1 = rotl64(h1, 27);
        h1 = h1.wrapping_add(h2);
        h1 = h1.wrapping_mul(5).wrapping_add(0x52dc_e729);

        k2 = k2.wrapping_mul(C2);
        k2 = rotl64(k2, 33);
        k2 = k2.wrapping_mul(C1);
        h2 ^= k2;

        h2 = rotl64(h2, 31);
        h2 = h2.wrapping_add(h1);
        h2 = h2.wrapping_mul(5).wrapping_add(0x3849_5ab5);
    }

    let tail = &data[n_blocks * 16..];
    let mut k1: u64 = 0;
    let mut k2: u64 = 0;

    let tail_len = tail.len();
    if tail_len >= 9 {
        for i in (9..=tail_len.min(15)).rev() {
            k2 ^= (tail[i - 1] as u64) << (8 * (i - 9));
        }
        k2 = k2.wrapping_mul(C2);
        k2 = rotl64(k2, 33);
        k2 = k2.wrapping_mul(C1);
        h2 ^= k2;
    }
    if tail_len >= 1 {
        for i in (1..=tail_len.min(8)).rev() {
            k1 ^= (tail[i - 1] as u64) << (8 * (i - 1));
        }
        k1 = k1.wrapping_mul(C1);
        k1 = rotl64(k1, 31);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;
    }

    h1 ^= len as u64;
    h2 ^= len as u64;

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    h1 = fmix64(h1);
    h2 = fmix64(h2);

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    Signature(h1, h2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let data = b"the quick brown fox";
        assert_eq!(
            murmurhash3_x64_128(data, 1973),
            murmurhash3_x64_128(data, 1973)
        );
    }

    #[test]
    fn different_inputs_differ() {
        let a = murmurhash3_x64_128(b"abc", 1973);
        let b = murmurhash3_x64_128(b"abd", 1973);
        assert_ne!(a, b);
    }

    #[test]
    fn empty_input_is_seed_derived() {
        let h = murmurhash3_x64_128(b"", 1973);
        assert!(!h.is_empty());
    }

    #[test]
    fn tail_lengths_all_distinct() {
        let mut seen = std::collections::HashSet::new();
        for len in 0..=20 {
            let data = vec![7u8; len];
            seen.insert(murmurhash3_x64_128(&data, 1973));
        }
        assert_eq!(seen.len(), 21);
    }
}
