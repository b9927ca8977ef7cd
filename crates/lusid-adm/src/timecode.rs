//! ADM timecodes (`HH:MM:SS.fffff`)

use crate::error::{AdmError, AdmResult};

/// Timecode used when a block carries no `rtime` or `duration`
pub const ZERO_TIMECODE: &str = "00:00:00.00000";

/// Convert an `HH:MM:SS.fffff` timecode to seconds.
///
/// Hours and minutes are integers, seconds may carry a fraction of any
/// precision.
///
/// # Errors
///
/// [`AdmError::InvalidTimecode`] if the text does not have exactly three
/// colon-separated fields, a field is not a number, or the hour and minute
/// fields overflow.
pub fn parse_timecode(text: &str) -> AdmResult<f64> {
    let invalid = || AdmError::InvalidTimecode(text.to_string());

    let mut fields = text.trim().split(':');
    let (Some(hours), Some(minutes), Some(seconds), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(invalid());
    };

    let hours: u64 = hours.parse().map_err(|_| invalid())?;
    let minutes: u64 = minutes.parse().map_err(|_| invalid())?;
    let seconds: f64 = seconds.parse().map_err(|_| invalid())?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(invalid());
    }

    let whole = hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .ok_or_else(invalid)?;

    Ok(whole as f64 + seconds)
}
