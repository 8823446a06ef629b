//! rmcp adapters: the server side exposes [`TemperatureTool`](crate::tool::TemperatureTool)
//! as an MCP tool, the client side routes server callbacks into a
//! [`CallbackRegistry`](crate::callbacks::CallbackRegistry).

pub mod client;
pub mod server;
pub mod wire;

pub use client::{call_get_temperature, WeatherClientService, CLIENT_NAME};
pub use server::{RmcpExchange, WeatherMcpServer, LOGGER_NAME, SERVER_NAME};
