//! Copying bytes across the host/guest boundary
//!
//! Host → guest: [`with_guest_bytes`] allocates a region with the guest's own
//! allocator, copies the payload in, hands `(ptr, len)` to a guest call and
//! releases the region again on every exit path.
//!
//! Guest → host: [`copy_out`] copies an exact byte range out of linear memory
//! into a host-owned buffer before control returns to the guest.

use tracing::{trace, warn};

use crate::error::{BoundsError, GuestError, GuestResult, MarshalError};
use crate::guest::Guest;

/// A payload placed in guest memory for the duration of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestSlice {
    pub ptr: u32,
    pub len: u32,
}

fn checked_range(
    memory_size: usize,
    ptr: u32,
    len: u32,
) -> Result<std::ops::Range<usize>, BoundsError> {
    let start = ptr as usize;
    let end = start.checked_add(len as usize);
    match end {
        Some(end) if end <= memory_size => Ok(start..end),
        _ => Err(BoundsError {
            ptr,
            len,
            memory_size,
        }),
    }
}

/// Borrow `(ptr, len)` of linear memory.
pub fn region(
    memory: &[u8],
    ptr: u32,
    len: u32,
) -> Result<&[u8], BoundsError> {
    let range = checked_range(memory.len(), ptr, len)?;
    Ok(&memory[range])
}

/// Mutably borrow `(ptr, len)` of linear memory.
pub fn region_mut(
    memory: &mut [u8],
    ptr: u32,
    len: u32,
) -> Result<&mut [u8], BoundsError> {
    let range = checked_range(memory.len(), ptr, len)?;
    Ok(&mut memory[range])
}

/// Copy `(ptr, len)` out of linear memory into a host buffer.
pub fn copy_out(
    memory: &[u8],
    ptr: u32,
    len: u32,
) -> Result<Vec<u8>, BoundsError> {
    region(memory, ptr, len).map(<[u8]>::to_vec)
}

/// Copy `bytes` into linear memory at `ptr`.
pub fn copy_in(
    memory: &mut [u8],
    ptr: u32,
    bytes: &[u8],
) -> Result<(), BoundsError> {
    let len = u32::try_from(bytes.len()).map_err(|_| BoundsError {
        ptr,
        len: u32::MAX,
        memory_size: memory.len(),
    })?;
    region_mut(memory, ptr, len)?.copy_from_slice(bytes);
    Ok(())
}

/// Place `bytes` in guest memory, run `call` with its location, release it.
///
/// The region is released exactly once whether `call` succeeds, reports a
/// guest failure, or the copy itself fails. A null region from the allocator
/// is an out-of-memory condition and `call` is never invoked.
///
/// An empty payload still occupies a one-byte region so the guest always
/// receives a valid pointer; the length passed to `call` is `0`.
pub fn with_guest_bytes<G, R>(
    guest: &mut G,
    bytes: &[u8],
    call: impl FnOnce(&mut G, GuestSlice) -> GuestResult<R>,
) -> Result<R, MarshalError>
where
    G: Guest + ?Sized,
{
    let len = u32::try_from(bytes.len())
        .map_err(|_| MarshalError::PayloadTooLarge { len: bytes.len() })?;
    let size = len.max(1);

    let ptr = guest.allocate(size)?;
    if ptr == 0 {
        return Err(MarshalError::OutOfMemory { requested: size });
    }
    trace!(ptr, size, "guest region acquired");

    let result = copy_in(guest.memory_mut(), ptr, bytes)
        .map_err(GuestError::from)
        .and_then(|()| call(guest, GuestSlice { ptr, len }));

    let released = guest.release(ptr, size);
    trace!(ptr, size, "guest region released");

    match (result, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(release_err)) => Err(release_err.into()),
        (Err(err), Ok(())) => Err(err.into()),
        (Err(err), Err(release_err)) => {
            warn!(%release_err, "releasing guest region failed after an earlier error");
            Err(err.into())
        }
    }
}
