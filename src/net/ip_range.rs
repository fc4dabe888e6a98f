//! Deterministic dotted-quad range generation.
//!
//! The fixture network uses a made-up private subnet, so the monitor's
//! static address has to be computed rather than discovered. The generator
//! walks addresses as a 4-byte odometer: octet 3 increments, rolling over
//! 255 into octet 2 and then octet 1. Octet 0 is never mutated, which
//! bounds every range to a sweep within the start's first octet.

use std::net::Ipv4Addr;

use crate::error::RangeError;

/// Generates an ordered, inclusive sequence of addresses.
///
/// Three forms:
///
/// - `generate_ips(start, Some(end), None)` walks from `start` to `end`,
///   both included, `end` exactly once as the final element.
/// - `generate_ips(start, None, None)` walks from `start` to `start` with
///   its last octet forced to 255.
/// - `generate_ips(start, _, Some(offset))` replaces the last octet with
///   `min(255, octet + offset)`. The adjusted address is both the effective
///   start and the terminal, so the sequence is exactly that one address;
///   the original start is not prepended. This is how the monitor address
///   is derived from the gateway (offset 1).
///
/// An explicit `end` below `start`, or with a different first octet, can
/// never be reached by the odometer and is rejected as [`RangeError`].
///
/// Pure and deterministic; repeated calls with the same input return the
/// same sequence.
pub fn generate_ips(
    start: Ipv4Addr,
    end: Option<Ipv4Addr>,
    offset: Option<u8>,
) -> Result<Vec<Ipv4Addr>, RangeError> {
    let octets = start.octets();

    if let Some(offset) = offset {
        // Offset adjusts the start and implicitly becomes the end: a
        // single-element range, clamped at 255 so it cannot loop.
        let last = octets[3].saturating_add(offset);
        return Ok(vec![Ipv4Addr::new(octets[0], octets[1], octets[2], last)]);
    }

    let terminal = end.unwrap_or(Ipv4Addr::new(octets[0], octets[1], octets[2], 255));
    let terminal_octets = terminal.octets();

    if terminal_octets[0] != octets[0] {
        return Err(RangeError::OutsideSweep {
            start,
            end: terminal,
        });
    }
    if u32::from(terminal) < u32::from(start) {
        return Err(RangeError::EndBeforeStart {
            start,
            end: terminal,
        });
    }

    let count = (u32::from(terminal) - u32::from(start) + 1) as usize;
    let mut range = Vec::with_capacity(count);
    range.push(start);

    let mut current = octets;
    while current != terminal_octets {
        // Odometer increment: low octet first, carry upward, octet 0 untouched.
        for i in (1..=3).rev() {
            if current[i] == 255 {
                current[i] = 0;
            } else {
                current[i] += 1;
                break;
            }
        }
        range.push(Ipv4Addr::from(current));
    }

    Ok(range)
}
