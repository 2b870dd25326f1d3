//! Flat per-token cost estimates for the conversation log.

use vitacoach_core::BackendKind;

/// USD per token, flat across input and output.
const PRIMARY_PER_TOKEN: f64 = 0.000015;
const SECONDARY_PER_TOKEN: f64 = 0.00003;

/// Estimated cost of an exchange given which slot answered.
pub fn cost_for(kind: BackendKind, total_tokens: u32) -> f64 {
    let rate = match kind {
        BackendKind::Primary => PRIMARY_PER_TOKEN,
        BackendKind::Secondary => SECONDARY_PER_TOKEN,
        BackendKind::Local => 0.0,
    };
    f64::from(total_tokens) * rate
}
