use super::super::effect::UiSink;
use super::{Flow, StreamEnd, TurnDispatcher};
use crate::api::stream::{Decoded, StreamParser};
use anyhow::Result;
use bytes::Bytes;
use futures::{Stream, StreamExt};

/// Reads the response body chunk by chunk until a terminal event, the
/// sentinel, a transport failure or end of stream.
pub(super) async fn drive_stream<S>(
    mut stream: S,
    dispatcher: &mut TurnDispatcher<'_>,
    sink: &mut dyn UiSink,
) -> StreamEnd
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    let mut parser = StreamParser::new();

    while let Some(chunk_result) = stream.next().await {
        let chunk = match chunk_result {
            Ok(chunk) => chunk,
            Err(error) => {
                tracing::error!(error = %error, "reading chat stream failed");
                dispatcher.transport_failed(sink);
                return StreamEnd::TransportFailed(error.to_string());
            }
        };

        for decoded in parser.process(&chunk) {
            match decoded {
                Decoded::Done => return StreamEnd::Sentinel,
                Decoded::Event(event) => {
                    if let Flow::Stop(end) = dispatcher.dispatch(event, sink) {
                        return end;
                    }
                }
            }
        }
    }

    parser.finish();
    if parser.skipped_payloads() > 0 {
        tracing::warn!(
            skipped = parser.skipped_payloads(),
            "chat stream closed after skipping undecodable events"
        );
    }
    StreamEnd::Closed
}
