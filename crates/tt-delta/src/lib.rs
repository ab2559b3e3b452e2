//! rsync-style binary delta engine for TinyTrack.
//!
//! A basis is described by a [`Signature`]: fixed-size blocks, each with a
//! weak rolling checksum and a strong digest. The [`DeltaEncoder`] slides a
//! window over the target, uses the weak checksum to find candidate blocks in
//! O(1) per byte and the strong digest to confirm them, and emits a
//! [`Delta`] of copy/insert ops. [`apply_delta`] replays those ops against
//! the basis.
//!
//! # Modules
//!
//! - [`rolling`] -- the Adler-style weak checksum
//! - [`buffer`] -- sliding window and literal accumulator
//! - [`signature`] -- block signatures of a basis
//! - [`encoder`] -- target scanning
//! - [`apply`] -- delta replay
//! - [`wire`] -- `TTSG`/`TTDL` binary formats with bounds-checked decoding

pub mod apply;
pub mod buffer;
pub mod delta;
pub mod encoder;
pub mod error;
pub mod rolling;
pub mod signature;
pub mod wire;

pub use apply::{apply_delta, apply_to_vec};
pub use buffer::{InsertAccumulator, RingBuffer};
pub use delta::{coalesce, Delta, DeltaOp};
pub use encoder::{make_delta, DeltaEncoder, STREAM_CHUNK_LEN};
pub use error::{DeltaError, DeltaResult, FormatError};
pub use rolling::RollingChecksum;
pub use signature::{
    make_signature, validate_block_size, BlockSignature, Signature, SignatureBuilder,
    MAX_BLOCK_SIZE, MIN_BLOCK_SIZE,
};
pub use wire::{
    decode_delta, decode_signature, encode_delta, encode_signature, looks_like_delta,
    write_delta, write_signature, DELTA_MAGIC, SIGNATURE_MAGIC,
};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use tt_types::ContentId;

    fn roundtrip(basis: &[u8], target: &[u8], block_size: u32) -> Delta {
        let sig = make_signature(basis, block_size).unwrap();
        let delta = make_delta(target, &sig).unwrap();
        let rebuilt = apply_to_vec(basis, &delta).unwrap();
        assert_eq!(rebuilt, target);
        delta
    }

    fn no_contiguous_copies(delta: &Delta) -> bool {
        delta.ops.windows(2).all(|pair| match pair {
            [DeltaOp::Copy { offset: a, length }, DeltaOp::Copy { offset: b, .. }] => {
                a + u64::from(*length) != *b
            }
            _ => true,
        })
    }

    #[test]
    fn small_edit_scenario() {
        let delta = roundtrip(b"AAABBB", b"AAAXXXBBB", 64);
        assert_eq!(delta.target_len(), 9);
    }

    #[test]
    fn basis_smaller_than_block() {
        let delta = roundtrip(b"HELLO", b"HELLOWORLD", 8192);
        assert_eq!(
            delta.ops,
            vec![
                DeltaOp::Copy {
                    offset: 0,
                    length: 5
                },
                DeltaOp::Insert {
                    data: b"WORLD".to_vec()
                },
            ]
        );
    }

    #[test]
    fn identical_inputs_copy_everything() {
        let mut rng = StdRng::seed_from_u64(7);
        let data: Vec<u8> = (0..50_000).map(|_| rng.gen()).collect();
        let delta = roundtrip(&data, &data, 1024);
        assert_eq!(delta.literal_len(), 0);
        assert_eq!(
            delta.ops,
            vec![DeltaOp::Copy {
                offset: 0,
                length: 50_000
            }]
        );
    }

    #[test]
    fn identical_inputs_with_short_tail_copy_everything() {
        // The basis's final short block repeats the start of block 3.
        let mut rng = StdRng::seed_from_u64(11);
        let mut data: Vec<u8> = (0..8 * 512).map(|_| rng.gen()).collect();
        let tail = data[3 * 512..3 * 512 + 100].to_vec();
        data.extend_from_slice(&tail);
        let delta = roundtrip(&data, &data, 512);
        assert_eq!(delta.literal_len(), 0);
        assert_eq!(
            delta.ops,
            vec![DeltaOp::Copy {
                offset: 0,
                length: data.len() as u32
            }]
        );
    }

    #[test]
    fn empty_basis_inserts_target_verbatim() {
        let target = b"brand new content".to_vec();
        let delta = roundtrip(b"", &target, 64);
        let joined: Vec<u8> = delta
            .ops
            .iter()
            .flat_map(|op| match op {
                DeltaOp::Insert { data } => data.clone(),
                DeltaOp::Copy { .. } => panic!("copy from empty basis"),
            })
            .collect();
        assert_eq!(joined, target);
    }

    #[test]
    fn empty_target_rebuilds_nothing() {
        let delta = roundtrip(b"basis bytes", b"", 64);
        assert!(delta.ops.is_empty());
    }

    #[test]
    fn edited_random_file_mostly_copies() {
        let mut rng = StdRng::seed_from_u64(42);
        let basis: Vec<u8> = (0..200_000).map(|_| rng.gen()).collect();
        let mut target = basis.clone();
        for _ in 0..20 {
            let at = rng.gen_range(0..target.len());
            target[at] ^= 0xff;
        }
        target.splice(1000..1000, b"a brand new paragraph".iter().copied());
        target.truncate(190_000);

        let delta = roundtrip(&basis, &target, 2048);
        assert!(delta.copy_len() > 140_000);
        assert!(no_contiguous_copies(&delta));
    }

    #[test]
    fn wire_encoded_delta_applies() {
        let basis: Vec<u8> = (0..30_000u32).map(|i| (i % 199) as u8).collect();
        let mut target = basis[5_000..].to_vec();
        target.extend_from_slice(&basis[..5_000]);

        let sig = decode_signature(&encode_signature(&make_signature(&basis[..], 512).unwrap()))
            .unwrap();
        let delta = decode_delta(&encode_delta(&make_delta(&target[..], &sig).unwrap())).unwrap();
        assert_eq!(apply_to_vec(&basis, &delta).unwrap(), target);
    }

    fn arb_op() -> impl Strategy<Value = DeltaOp> {
        prop_oneof![
            (any::<u64>().prop_map(|o| o >> 1), 1..=u32::MAX)
                .prop_map(|(offset, length)| DeltaOp::Copy { offset, length }),
            prop::collection::vec(any::<u8>(), 0..64).prop_map(|data| DeltaOp::Insert { data }),
        ]
    }

    fn arb_block() -> impl Strategy<Value = BlockSignature> {
        (any::<u32>(), any::<u32>(), any::<[u8; 20]>()).prop_map(|(index, weak, strong)| {
            BlockSignature {
                index,
                weak,
                strong: ContentId::from_hash(strong),
            }
        })
    }

    proptest! {
        #[test]
        fn delta_rebuilds_target(
            basis in prop::collection::vec(any::<u8>(), 0..3000),
            target in prop::collection::vec(any::<u8>(), 0..3000),
            block_size in 64u32..300,
        ) {
            let sig = make_signature(&basis[..], block_size).unwrap();
            let delta = make_delta(&target[..], &sig).unwrap();
            prop_assert_eq!(apply_to_vec(&basis, &delta).unwrap(), target);
            prop_assert!(no_contiguous_copies(&delta));
        }

        #[test]
        fn identical_inputs_have_no_literals(
            basis in prop::collection::vec(0u8..4, 64..3000),
            block_size in 64u32..300,
        ) {
            prop_assume!(basis.len() >= block_size as usize);
            let sig = make_signature(&basis[..], block_size).unwrap();
            let delta = make_delta(&basis[..], &sig).unwrap();
            prop_assert_eq!(delta.literal_len(), 0);
            prop_assert_eq!(
                delta.ops,
                vec![DeltaOp::Copy { offset: 0, length: basis.len() as u32 }]
            );
        }

        #[test]
        fn spliced_target_rebuilds(
            basis in prop::collection::vec(0u8..4, 500..4000),
            cut in 0usize..500,
            insert in prop::collection::vec(any::<u8>(), 0..200),
        ) {
            let mut target = basis.clone();
            target.splice(cut..cut, insert);
            let sig = make_signature(&basis[..], 64).unwrap();
            let delta = make_delta(&target[..], &sig).unwrap();
            prop_assert_eq!(apply_to_vec(&basis, &delta).unwrap(), target);
        }

        #[test]
        fn delta_wire_roundtrip(
            block_size in any::<u32>(),
            ops in prop::collection::vec(arb_op(), 0..50),
        ) {
            let delta = Delta::new(block_size, ops);
            prop_assert_eq!(decode_delta(&encode_delta(&delta)).unwrap(), delta);
        }

        #[test]
        fn signature_wire_roundtrip(
            block_size in MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE,
            blocks in prop::collection::vec(arb_block(), 0..50),
        ) {
            let sig = Signature::new(block_size, blocks);
            prop_assert_eq!(decode_signature(&encode_signature(&sig)).unwrap(), sig);
        }
    }
}
