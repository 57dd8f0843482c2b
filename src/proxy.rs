use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::ratelimit::{self, TokenBucket};

/// Runs the two concurrent byte-copy flows of §4.5 between `client` and
/// `target`, using the request's preallocated buffers. Returns the final
/// (`req_bytes`, `resp_bytes`) pair and the first I/O error encountered,
/// if any.
///
/// Byte counts are tracked in shared atomics rather than returned from the
/// copy futures themselves, so they remain observable even if one flow
/// errors and `try_join!` drops the other mid-flight (see SPEC_FULL.md §9
/// Design Notes, "Byte accounting channel").
pub async fn run(
    client: TcpStream,
    target: TcpStream,
    buf_in: &mut [u8],
    buf_out: &mut [u8],
    in_bucket: Option<&TokenBucket>,
    out_bucket: Option<&TokenBucket>,
) -> (u64, u64, std::io::Result<()>) {
    let (client_r, client_w) = client.into_split();
    let (target_r, target_w) = target.into_split();

    let req_bytes = Arc::new(AtomicU64::new(0));
    let resp_bytes = Arc::new(AtomicU64::new(0));

    let req_fut = copy_direction(client_r, target_w, buf_in, in_bucket, Arc::clone(&req_bytes));
    let resp_fut = copy_direction(target_r, client_w, buf_out, out_bucket, Arc::clone(&resp_bytes));

    let result = tokio::try_join!(req_fut, resp_fut).map(|_| ());

    (req_bytes.load(Ordering::Relaxed), resp_bytes.load(Ordering::Relaxed), result)
}

/// One direction of the bidirectional copy: read-into-buffer,
/// write-full-buffer, repeated until EOF. On termination, half-closes
/// `dst`'s write side so the peer flow can still observe EOF on its own
/// schedule.
async fn copy_direction<R, W>(
    mut src: R,
    mut dst: W,
    buffer: &mut [u8],
    bucket: Option<&TokenBucket>,
    counter: Arc<AtomicU64>,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let result = copy_loop(&mut src, &mut dst, buffer, bucket, &counter).await;
    let _ = dst.shutdown().await;
    result
}

async fn copy_loop<R, W>(
    src: &mut R,
    dst: &mut W,
    buffer: &mut [u8],
    bucket: Option<&TokenBucket>,
    counter: &AtomicU64,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let n = src.read(buffer).await?;
        if n == 0 {
            return Ok(());
        }

        if let Some(bucket) = bucket {
            ratelimit::acquire(bucket, n as u32).await;
        }

        dst.write_all(&buffer[..n]).await?;
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }
}
