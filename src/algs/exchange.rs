//! Two-stage point-to-point exchange of byte payloads with neighbor ranks.
//!
//! Stage 1 exchanges payload lengths, stage 2 the payloads themselves. Both
//! stages post every receive before any send and drain every send handle
//! before returning, even if an error occurs. Every receive and every send is
//! bounded by a timeout: a neighbor that stays silent yields
//! [`MeshError::ExchangeTimeout`], a send that never completes yields
//! [`MeshError::CommError`]. The first error wins.

use std::collections::BTreeMap;
use std::time::Duration;

use bytemuck::Zeroable;

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::wire::{WireCount, cast_slice, cast_slice_mut, expect_exact_len};
use crate::mesh_error::MeshError;

/// Posts irecv/isend for the byte length each neighbor will send (symmetric).
/// Returns a map `nbr → len` once all receives have completed.
pub fn exchange_sizes<C>(
    outgoing: &BTreeMap<usize, Vec<u8>>,
    comm: &C,
    tag: CommTag,
    timeout: Duration,
) -> Result<BTreeMap<usize, usize>, MeshError>
where
    C: Communicator,
{
    // 1) post all receives
    let mut recv_size = Vec::with_capacity(outgoing.len());
    for &nbr in outgoing.keys() {
        let mut cnt = WireCount::zeroed();
        let h = comm.irecv(
            nbr,
            tag.as_u16(),
            cast_slice_mut(std::slice::from_mut(&mut cnt)),
        );
        recv_size.push((nbr, h));
    }

    // 2) post all sends; a size that does not fit still gets an (empty)
    // message so the peer's receive completes
    let mut maybe_err = None;
    let mut pending_sends = Vec::with_capacity(outgoing.len());
    for (&nbr, payload) in outgoing {
        let count = match WireCount::new(payload.len()) {
            Ok(count) => count,
            Err(_) => {
                maybe_err.get_or_insert(MeshError::CommError {
                    neighbor: nbr,
                    reason: format!(
                        "payload of {} bytes overflows the size header",
                        payload.len()
                    ),
                });
                pending_sends.push((nbr, comm.isend(nbr, tag.as_u16(), &[])));
                continue;
            }
        };
        pending_sends.push((
            nbr,
            comm.isend(nbr, tag.as_u16(), cast_slice(std::slice::from_ref(&count))),
        ));
    }

    // 3) wait for all recvs, collect counts (but do not early-return)
    let mut sizes_in = BTreeMap::new();
    for (nbr, h) in recv_size {
        let received = h.wait_timeout(timeout);
        if maybe_err.is_some() {
            continue; // already have an error; just drain
        }
        match received {
            Ok(Some(data)) => {
                match expect_exact_len(nbr, data.len(), std::mem::size_of::<WireCount>()) {
                    Ok(()) => {
                        let count: WireCount = bytemuck::pod_read_unaligned(&data);
                        sizes_in.insert(nbr, count.get());
                    }
                    Err(err) => maybe_err = Some(err),
                }
            }
            Ok(None) | Err(_) => {
                maybe_err = Some(MeshError::ExchangeTimeout {
                    neighbor: nbr,
                    millis: timeout.as_millis(),
                });
            }
        }
    }

    // 4) always drain all send handles before returning
    drain_sends(pending_sends, timeout, &mut maybe_err);

    match maybe_err {
        Some(err) => Err(err),
        None => Ok(sizes_in),
    }
}

/// Exchange one payload with every neighbor in `outgoing`.
///
/// Returns `nbr → payload received from nbr`. Neighbors are visited in
/// ascending rank order.
pub fn exchange_payloads<C>(
    outgoing: &BTreeMap<usize, Vec<u8>>,
    comm: &C,
    tag: CommTag,
    timeout: Duration,
) -> Result<BTreeMap<usize, Vec<u8>>, MeshError>
where
    C: Communicator,
{
    let sizes = exchange_sizes(outgoing, comm, tag, timeout)?;
    let data_tag = tag.offset(1);

    let mut recv_data = Vec::with_capacity(sizes.len());
    for (&nbr, &len) in &sizes {
        let mut buffer = vec![0u8; len];
        let h = comm.irecv(nbr, data_tag.as_u16(), &mut buffer);
        recv_data.push((nbr, len, h));
    }

    let mut pending_sends = Vec::with_capacity(outgoing.len());
    for (&nbr, payload) in outgoing {
        pending_sends.push((nbr, comm.isend(nbr, data_tag.as_u16(), payload)));
    }

    let mut received = BTreeMap::new();
    let mut maybe_err = None;
    for (nbr, len, h) in recv_data {
        let data = h.wait_timeout(timeout);
        if maybe_err.is_some() {
            continue;
        }
        match data {
            Ok(Some(bytes)) => match expect_exact_len(nbr, bytes.len(), len) {
                Ok(()) => {
                    received.insert(nbr, bytes);
                }
                Err(err) => maybe_err = Some(err),
            },
            Ok(None) | Err(_) => {
                maybe_err = Some(MeshError::ExchangeTimeout {
                    neighbor: nbr,
                    millis: timeout.as_millis(),
                });
            }
        }
    }

    drain_sends(pending_sends, timeout, &mut maybe_err);

    match maybe_err {
        Some(err) => Err(err),
        None => {
            log::debug!(
                "rank {} exchanged payloads with {} neighbor(s)",
                comm.rank(),
                received.len()
            );
            Ok(received)
        }
    }
}

/// Wait out every send; one that does not finish in time becomes the error
/// unless an earlier one is already recorded.
fn drain_sends<H: Wait>(
    pending: Vec<(usize, H)>,
    timeout: Duration,
    maybe_err: &mut Option<MeshError>,
) {
    for (nbr, send) in pending {
        if send.wait_timeout(timeout).is_err() {
            log::warn!("send to rank {nbr} did not complete within {timeout:?}");
            maybe_err.get_or_insert(MeshError::CommError {
                neighbor: nbr,
                reason: format!("send not completed within {} ms", timeout.as_millis()),
            });
        }
    }
}
