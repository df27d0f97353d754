use log::debug;
use std::fs::File;
use std::io;
use tokio::net::TcpStream;

/// Largest amount handed to a single `sendfile(2)` call.
#[cfg(target_os = "linux")]
const MAX_SENDFILE_CHUNK: u64 = 1 << 20;

/// Sends `length` bytes of `file` starting at `offset` over `stream`, without copying
/// them through user space. Stops early when the peer stops accepting data.
#[cfg(target_os = "linux")]
pub async fn send_file(
    stream: &mut TcpStream,
    file: File,
    offset: u64,
    length: u64,
) -> io::Result<u64> {
    use std::os::unix::io::AsRawFd;
    use tokio::io::Interest;

    if length == 0 {
        return Ok(0);
    }
    let in_fd = file.as_raw_fd();
    let out_fd = stream.as_raw_fd();
    let mut position = libc::off_t::try_from(offset)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset out of range"))?;
    let mut sent = 0u64;

    while sent < length {
        let chunk = (length - sent).min(MAX_SENDFILE_CHUNK) as usize;
        stream.writable().await?;
        let result = stream.try_io(Interest::WRITABLE, || {
            // SAFETY: both descriptors stay open for the duration of the call and
            // `position` is a valid, exclusively borrowed offset.
            let n = unsafe { libc::sendfile(out_fd, in_fd, &mut position, chunk) };
            if n < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(n as u64)
            }
        });
        match result {
            Ok(0) => break,
            Ok(n) => sent += n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    debug!("sendfile moved {} of {} bytes", sent, length);
    Ok(sent)
}

#[cfg(not(target_os = "linux"))]
pub async fn send_file(
    stream: &mut TcpStream,
    file: File,
    offset: u64,
    length: u64,
) -> io::Result<u64> {
    use tokio::io::{AsyncReadExt, AsyncSeekExt};

    if length == 0 {
        return Ok(0);
    }
    let mut file = tokio::fs::File::from_std(file);
    file.seek(io::SeekFrom::Start(offset)).await?;
    let mut limited = file.take(length);
    let sent = tokio::io::copy(&mut limited, stream).await?;
    debug!("copied {} of {} bytes", sent, length);
    Ok(sent)
}
