mod estimate_fee;
mod healthz;

pub(super) use {estimate_fee::estimate_fee, healthz::healthz};
