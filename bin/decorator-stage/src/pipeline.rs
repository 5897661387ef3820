use std::{num::NonZeroUsize, sync::Arc};

use decorator_components::transforms::DecoratorConfiguration;
use decorator_core::{
    components::{transforms::TransformBuilder as _, ComponentContext},
    data_model::Batch,
    generic_error,
    topology::{
        interconnect::{BatchSender, Consumer, Wiring},
        ComponentId,
    },
    ErrorContext as _, GenericError,
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt as _, AsyncWrite, AsyncWriteExt as _, BufReader},
    sync::mpsc,
};
use tracing::{debug, info, warn};

use crate::config::{load_configuration, RunConfig};

const STDIN_ID: ComponentId = ComponentId::from_static("stdin");
const STDOUT_ID: ComponentId = ComponentId::from_static("stdout");

/// Runs the decorator stage between standard input and standard output until the input is exhausted.
pub async fn run(config: RunConfig) -> Result<(), GenericError> {
    let stage_id = ComponentId::try_from(config.stage_id.as_str())
        .map_err(|e| generic_error!("Invalid stage identifier '{}': {}", config.stage_id, e))?;
    let capacity = NonZeroUsize::new(config.buffer_size).ok_or_else(|| generic_error!("Buffer size must be non-zero."))?;

    let configuration = load_configuration(config.config.as_deref())?;
    let decorator = Arc::new(DecoratorConfiguration::from_configuration(&configuration));
    info!(stage_id = %stage_id, profile = ?decorator.profile(), "Decorator stage starting.");

    #[cfg(unix)]
    let reload_task = tokio::spawn(reload::reload_on_hangup(Arc::clone(&decorator), config.config.clone())?);

    let result = run_pipeline(
        &decorator,
        stage_id,
        capacity,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await;

    #[cfg(unix)]
    reload_task.abort();

    result.map(|_| ())
}

/// Runs the decorator over batches read from `reader`, writing decorated batches to `writer`.
///
/// Returns the writer once the input is exhausted and every decorated batch has been written.
async fn run_pipeline<R, W>(
    decorator: &DecoratorConfiguration, stage_id: ComponentId, capacity: NonZeroUsize, reader: R, writer: W,
) -> Result<W, GenericError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let component_context = ComponentContext::transform(stage_id);
    let transform = decorator.build(component_context.clone()).await?;
    let (wiring, transform_context) = Wiring::new(component_context, capacity);

    let (output_tx, output_rx) = mpsc::channel(capacity.get());
    wiring.consumers_connected(vec![Consumer::new(STDOUT_ID, output_tx)]);

    let sender = wiring
        .producers_connected(&[STDIN_ID])?
        .pop()
        .ok_or_else(|| generic_error!("No sender returned for producer '{}'.", STDIN_ID))?;
    wiring.close();

    let transform_task = tokio::spawn(transform.run(transform_context));
    let writer_task = tokio::spawn(write_batches(output_rx, writer));

    read_batches(reader, sender).await?;

    transform_task.await.error_context("Decorator task panicked.")??;

    if let Some(last) = wiring.polled() {
        debug!(records = last.len(), "Last batch published by the decorator.");
    }

    // Releases the output channel so the writer can finish.
    drop(wiring);

    writer_task.await.error_context("Output task panicked.")?
}

async fn read_batches<R>(reader: R, sender: BatchSender) -> Result<(), GenericError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_number = 0usize;

    while let Some(line) = lines.next_line().await.error_context("Failed to read from input.")? {
        line_number += 1;

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Batch>(line) {
            Ok(batch) => sender.send(batch).await?,
            Err(e) => warn!(line = line_number, error = %e, "Skipping invalid batch."),
        }
    }

    debug!(lines = line_number, "Reached end of input.");

    Ok(())
}

async fn write_batches<W>(mut batches: mpsc::Receiver<Batch>, mut writer: W) -> Result<W, GenericError>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();

    while let Some(batch) = batches.recv().await {
        buf.clear();
        serde_json::to_writer(&mut buf, &batch).error_context("Failed to serialize batch.")?;
        buf.push(b'\n');

        writer.write_all(&buf).await.error_context("Failed to write batch to output.")?;
        writer.flush().await.error_context("Failed to flush output.")?;
    }

    Ok(writer)
}

#[cfg(unix)]
mod reload {
    use std::{future::Future, path::PathBuf, sync::Arc};

    use decorator_components::transforms::DecoratorConfiguration;
    use decorator_core::{ErrorContext as _, GenericError};
    use tokio::signal::unix::{signal, SignalKind};
    use tracing::{info, warn};

    use crate::config::load_configuration;

    /// Reloads the configuration and replaces the device profile every time the process receives `SIGHUP`.
    ///
    /// A configuration that fails to load leaves the current profile in place.
    pub fn reload_on_hangup(
        decorator: Arc<DecoratorConfiguration>, path: Option<PathBuf>,
    ) -> Result<impl Future<Output = ()>, GenericError> {
        let mut hangup = signal(SignalKind::hangup()).error_context("Failed to install SIGHUP handler.")?;

        Ok(async move {
            while hangup.recv().await.is_some() {
                match load_configuration(path.as_deref()) {
                    Ok(config) => {
                        decorator.updated(&config);
                        info!(profile = ?decorator.profile(), "Reloaded configuration.");
                    }
                    Err(e) => warn!(error = ?e, "Failed to reload configuration. Keeping current device profile."),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use decorator_components::transforms::DeviceProfile;
    use decorator_core::data_model::{Record, TypedValue};

    use super::*;

    fn stage_id() -> ComponentId {
        ComponentId::try_from("decorator").unwrap()
    }

    fn capacity() -> NonZeroUsize {
        NonZeroUsize::new(4).unwrap()
    }

    fn parse_output(output: &[u8]) -> Vec<Batch> {
        std::str::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn decorates_every_batch_in_order() {
        let decorator = DecoratorConfiguration::from_profile(
            DeviceProfile::default()
                .with_device_id("dev-1")
                .with_position(45.0, 9.0),
        );
        let input = concat!(
            r#"{"source":"sensor-1","records":[{"temp":{"double":21.5}},{"hum":{"integer":60}}]}"#,
            "\n",
            r#"{"source":"sensor-2","records":[{"on":{"boolean":true}}]}"#,
            "\n",
        );

        let output = run_pipeline(&decorator, stage_id(), capacity(), input.as_bytes(), Vec::new())
            .await
            .unwrap();
        let batches = parse_output(&output);

        assert_eq!(batches.len(), 2);

        assert_eq!(batches[0].source(), &stage_id());
        assert_eq!(
            batches[0].records(),
            &[
                Record::new().with_field("hum", TypedValue::Integer(60)),
                Record::new()
                    .with_field("temp", TypedValue::Double(21.5))
                    .with_field("device_name", "dev-1")
                    .with_field("device_long", TypedValue::Double(9.0))
                    .with_field("device_lat", TypedValue::Double(45.0)),
            ]
        );

        assert_eq!(
            batches[1].records(),
            &[Record::new()
                .with_field("on", TypedValue::Boolean(true))
                .with_field("device_name", "dev-1")
                .with_field("device_long", TypedValue::Double(9.0))
                .with_field("device_lat", TypedValue::Double(45.0))]
        );
    }

    #[tokio::test]
    async fn skips_invalid_and_empty_input() {
        let decorator = DecoratorConfiguration::from_profile(DeviceProfile::default().with_device_id("dev-1"));
        let input = concat!(
            "not json\n",
            "\n",
            r#"{"source":"sensor-1","records":[]}"#,
            "\n",
            r#"{"source":"sensor-1","records":[{"temp":{"double":1.0}}]}"#,
            "\n",
        );

        let output = run_pipeline(&decorator, stage_id(), capacity(), input.as_bytes(), Vec::new())
            .await
            .unwrap();
        let batches = parse_output(&output);

        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0].records(),
            &[Record::new()
                .with_field("temp", TypedValue::Double(1.0))
                .with_field("device_name", "dev-1")]
        );
    }

    #[tokio::test]
    async fn empty_input_produces_no_output() {
        let decorator = DecoratorConfiguration::from_profile(DeviceProfile::default());

        let output = run_pipeline(&decorator, stage_id(), capacity(), &b""[..], Vec::new())
            .await
            .unwrap();

        assert!(output.is_empty());
    }
}
