use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info};

use crate::core::taste::TasteEngine;
use crate::error::{OutputError, PalateError};

use super::payload::{Contract, respond};

/// Read one request from `input`, write exactly one JSON document to `output`.
///
/// Returns `Ok(true)` when the success payload was written and `Ok(false)` when
/// an error envelope was written instead. Only a failure to write the
/// response itself is returned as an error.
pub async fn run<R, W>(
    engine: &dyn TasteEngine,
    contract: Contract,
    mut input: R,
    mut output: W,
) -> Result<bool, OutputError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut body = Vec::new();
    let result = match input.read_to_end(&mut body).await {
        Ok(bytes) => {
            info!(%contract, bytes, "Processing request");
            respond(engine, contract, &body).await
        }
        Err(err) => Err(PalateError::Other(
            anyhow::Error::new(err).context("failed to read request"),
        )),
    };

    let (payload, success) = match result {
        Ok(payload) => (payload, true),
        Err(err) => {
            error!(%contract, error = %err, "Request failed");
            (serde_json::to_vec(&err.envelope())?, false)
        }
    };

    output.write_all(&payload).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(success)
}
