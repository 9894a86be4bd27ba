//! Non-blocking socket adapter for the `rustls` record layer.

use std::io;

use tokio::net::TcpStream;

/// Exposes a tokio `TcpStream` as `std::io::Read + Write` without ever blocking.
///
/// Reads and writes go straight to `try_read` / `try_write`, so a socket that
/// is not ready surfaces as `ErrorKind::WouldBlock` and clears tokio's cached
/// readiness. The handshake driver then awaits readiness for that direction.
pub(super) struct NonBlockingIo<'a>(pub(super) &'a TcpStream);

impl io::Read for NonBlockingIo<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.try_read(buf)
    }
}

impl io::Write for NonBlockingIo<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.try_write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
