//! JSON-RPC plumbing shared by the wallet and ledger clients.

pub mod codec;
pub mod error;
pub mod message;
pub mod transport;

pub use error::{RpcError, RpcResult};
pub use message::{RpcErrorObject, RpcRequest, RpcResponse, JSONRPC_VERSION};
pub use transport::{HttpTransport, RpcTransport};
