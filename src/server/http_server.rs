use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use may::coroutine::JoinHandle;
use may_minihttp::HttpService;
use tracing::info;

use super::service::ApiService;
use crate::dispatcher::ApiRouter;

/// Wrapper around may_minihttp's HTTP server.
pub struct HttpServer<T>(pub T);

/// Handle to a running HTTP server
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Wait until the server accepts connections.
    ///
    /// # Errors
    ///
    /// `TimedOut` if the server is not reachable within ~250ms (50 attempts × 5ms).
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Cancel the server coroutine and wait for it to finish.
    #[allow(unsafe_code)]
    pub fn stop(self) {
        // SAFETY: the handle is owned here and the coroutine is not used after cancellation.
        unsafe {
            self.handle.coroutine().cancel();
        }
        drop(self.handle.join());
    }

    /// Block until the server coroutine finishes.
    ///
    /// # Errors
    ///
    /// If the server coroutine panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Bind and start serving.
    ///
    /// # Errors
    ///
    /// If the address is invalid or the port cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let handle = may_minihttp::HttpServer(self.0).start(addr)?;
        Ok(ServerHandle { addr, handle })
    }
}

/// Configure the coroutine runtime from the router config and serve it on `addr`.
///
/// # Errors
///
/// If the address is invalid or the port cannot be bound.
pub fn serve<A: ToSocketAddrs>(router: Arc<ApiRouter>, addr: A) -> io::Result<ServerHandle> {
    let stack_size = router.config().stack_size;
    may::config().set_stack_size(stack_size);
    let handle = HttpServer(ApiService::new(router)).start(addr)?;
    info!(addr = %handle.addr(), stack_size, "API server listening");
    Ok(handle)
}
