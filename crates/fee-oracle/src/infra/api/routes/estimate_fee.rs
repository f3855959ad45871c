use {
    crate::{
        domain::{Estimator, Snapshot, eth},
        infra::{api::error::Error, observe},
    },
    axum::Json,
    serde::Serialize,
};

pub(in crate::infra::api) fn estimate_fee(
    app: axum::Router<Estimator>,
) -> axum::Router<Estimator> {
    app.route("/estimate-fee", axum::routing::get(route))
}

/// Largest integer a JSON number holds exactly in an IEEE 754 double.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateFeeResponse {
    /// Base fee of the block the fees were computed from, in gwei.
    pub base_fee_per_gas: Option<f64>,
    /// Average priority fee of that block, in gwei.
    pub average_priority_fee: Option<f64>,
    /// At most [`MAX_SAFE_INTEGER`] so JavaScript clients read it exactly.
    pub latest_block_number: Option<u64>,
    /// Whether the fees belong to `latest_block_number`.
    pub is_fee_updated: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("{field} of {value} is not representable as a JSON number")]
pub struct SerializationFault {
    field: &'static str,
    value: String,
}

impl TryFrom<Snapshot> for EstimateFeeResponse {
    type Error = SerializationFault;

    fn try_from(snapshot: Snapshot) -> Result<Self, Self::Error> {
        let number = |field: &'static str, value: Option<eth::Gwei>| {
            value
                .map(|gwei| {
                    gwei.to_f64().ok_or_else(|| SerializationFault {
                        field,
                        value: gwei.to_string(),
                    })
                })
                .transpose()
        };

        Ok(Self {
            base_fee_per_gas: number("baseFeePerGas", snapshot.base_fee_per_gas)?,
            average_priority_fee: number("averagePriorityFee", snapshot.average_priority_fee)?,
            latest_block_number: snapshot
                .latest_block_number
                .map(u64::from)
                .map(|block| {
                    if block <= MAX_SAFE_INTEGER {
                        Ok(block)
                    } else {
                        Err(SerializationFault {
                            field: "latestBlockNumber",
                            value: block.to_string(),
                        })
                    }
                })
                .transpose()?,
            is_fee_updated: snapshot.is_fee_current,
        })
    }
}

async fn route(
    estimator: axum::extract::State<Estimator>,
) -> Result<Json<EstimateFeeResponse>, (axum::http::StatusCode, Json<Error>)> {
    let snapshot = estimator.snapshot();
    observe::estimate_requested(&snapshot);
    let response = EstimateFeeResponse::try_from(snapshot).map_err(|err| {
        observe::estimate_response_failed(&err);
        Error::internal()
    })?;
    Ok(Json(response))
}
