use bytes::Bytes;
use futures_util::{FutureExt, SinkExt, StreamExt};
use pipebench_frame::{FrameCodec, FrameConfig, FrameError};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Result;
use crate::handler::{FrameHandler, Outbound};

/// Upper bound on frames handled between two flushes.
const MAX_BATCH_FRAMES: usize = 1024;

/// Why a connection stopped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEnd {
    /// The peer closed or reset the connection.
    PeerClosed,
    /// The shutdown token fired.
    Cancelled,
}

/// Frame counts for one finished connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStats {
    pub frames_received: u64,
    pub frames_sent: u64,
    pub end: ConnectionEnd,
}

/// Drive one connection with `handler` until the peer leaves or `shutdown` fires.
///
/// Reading and writing make progress independently: the handler's output is
/// queued to a writer that flushes once per queued batch, while inbound frames
/// keep being decoded even when the socket is not writable. Frames that are
/// already decodable are handled without waiting and their replies form one
/// batch. A frame above the configured ceiling ends the connection with an
/// error. A peer close or reset ends it cleanly, after replies to every frame
/// already received have been written.
///
/// [`FrameHandler::on_closed`] is called exactly once before returning.
pub async fn run_connection<S, H>(
    stream: S,
    config: &FrameConfig,
    handler: &mut H,
    shutdown: CancellationToken,
) -> Result<ConnectionStats>
where
    S: AsyncRead + AsyncWrite + Send,
    H: FrameHandler + ?Sized,
{
    let result = drive(stream, config, handler, &shutdown).await;
    handler.on_closed();
    result
}

async fn drive<S, H>(
    stream: S,
    config: &FrameConfig,
    handler: &mut H,
    shutdown: &CancellationToken,
) -> Result<ConnectionStats>
where
    S: AsyncRead + AsyncWrite + Send,
    H: FrameHandler + ?Sized,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let mut reader = FramedRead::new(read_half, FrameCodec::with_config(config));
    let mut writer = FramedWrite::new(write_half, FrameCodec::with_config(config));
    let (queue, pending) = mpsc::unbounded_channel();
    let mut received = 0;
    let mut sent = 0;

    let outcome = {
        let reading = read_frames(&mut reader, handler, queue, &mut received);
        let writing = write_frames(&mut writer, pending, &mut sent);
        tokio::pin!(reading, writing);

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => Ok(ConnectionEnd::Cancelled),
            read = &mut reading => match read {
                // Inbound side is done; the queue is closed, so the writer
                // finishes once every reply is out.
                Ok(()) => tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => Ok(ConnectionEnd::Cancelled),
                    written = &mut writing => written.map(|()| ConnectionEnd::PeerClosed),
                },
                Err(err) => Err(err),
            },
            written = &mut writing => written.map(|()| ConnectionEnd::PeerClosed),
        }
    };

    let end = match outcome {
        Ok(end) => end,
        Err(err) if err.is_disconnect() => {
            debug!(error = %err, received, sent, "connection lost");
            ConnectionEnd::PeerClosed
        }
        Err(err) => return Err(err.into()),
    };
    if end == ConnectionEnd::PeerClosed {
        debug!(received, sent, "peer closed connection");
    }
    Ok(ConnectionStats {
        frames_received: received,
        frames_sent: sent,
        end,
    })
}

/// Feed inbound frames to the handler and queue its output in batches.
///
/// Returns `Ok(())` on a clean end of stream.
async fn read_frames<R, H>(
    reader: &mut FramedRead<R, FrameCodec>,
    handler: &mut H,
    queue: UnboundedSender<Vec<Bytes>>,
    received: &mut u64,
) -> std::result::Result<(), FrameError>
where
    R: AsyncRead + Unpin,
    H: FrameHandler + ?Sized,
{
    let mut out = Outbound::new();
    handler.on_active(&mut out);
    enqueue(&queue, &mut out)?;

    while let Some(frame) = reader.next().await {
        let mut frame = frame?;
        let mut batch = 0;
        loop {
            handler.on_frame(frame, &mut out);
            *received += 1;
            batch += 1;
            if batch == MAX_BATCH_FRAMES {
                break;
            }
            match reader.next().now_or_never() {
                Some(Some(next)) => frame = next?,
                Some(None) => return enqueue(&queue, &mut out),
                None => break,
            }
        }
        enqueue(&queue, &mut out)?;
    }
    Ok(())
}

fn enqueue(
    queue: &UnboundedSender<Vec<Bytes>>,
    out: &mut Outbound,
) -> std::result::Result<(), FrameError> {
    if out.is_empty() {
        return Ok(());
    }
    // The writer only drops its end once it has failed or finished.
    queue
        .send(out.take())
        .map_err(|_| FrameError::ConnectionClosed)
}

/// Write queued batches, flushing once per wake-up, until the queue closes.
async fn write_frames<W>(
    writer: &mut FramedWrite<W, FrameCodec>,
    mut pending: UnboundedReceiver<Vec<Bytes>>,
    sent: &mut u64,
) -> std::result::Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(batch) = pending.recv().await {
        feed(writer, batch, sent).await?;
        while let Ok(batch) = pending.try_recv() {
            feed(writer, batch, sent).await?;
        }
        writer.flush().await?;
    }
    Ok(())
}

async fn feed<W>(
    writer: &mut FramedWrite<W, FrameCodec>,
    batch: Vec<Bytes>,
    sent: &mut u64,
) -> std::result::Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    for frame in batch {
        writer.feed(frame).await?;
        *sent += 1;
    }
    Ok(())
}
