use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use crate::delta::{Delta, DeltaOp};
use crate::error::{DeltaError, DeltaResult};

/// Replay `delta` against a random-access `basis`, writing the target to
/// `output`. Returns the number of bytes written.
///
/// Ops are applied strictly in order in a single forward pass over the
/// output. A copy that runs past the end of the basis fails with
/// [`DeltaError::Reconstruction`]; that signals a corrupt or mismatched
/// basis and is never retried.
pub fn apply_delta<B, W>(basis: &mut B, delta: &Delta, output: &mut W) -> DeltaResult<u64>
where
    B: Read + Seek,
    W: Write,
{
    let mut written = 0u64;
    for op in &delta.ops {
        match op {
            DeltaOp::Insert { data } => {
                output.write_all(data)?;
                written += data.len() as u64;
            }
            DeltaOp::Copy { offset, length } => {
                basis.seek(SeekFrom::Start(*offset))?;
                let wanted = u64::from(*length);
                let copied = io::copy(&mut basis.by_ref().take(wanted), output)?;
                if copied < wanted {
                    return Err(DeltaError::Reconstruction { offset: *offset });
                }
                written += copied;
            }
        }
    }
    Ok(written)
}

/// Apply `delta` to an in-memory basis and collect the target.
pub fn apply_to_vec(basis: &[u8], delta: &Delta) -> DeltaResult<Vec<u8>> {
    let mut output = Vec::new();
    apply_delta(&mut Cursor::new(basis), delta, &mut output)?;
    Ok(output)
}
