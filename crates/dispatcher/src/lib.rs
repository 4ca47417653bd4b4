//! # Dispatcher
//!
//! 事件投递模块。
//!
//! 负责：
//! - 按租户配置选择直连通道或队列通道 (每次调用仅一个)
//! - 直连通道：HTTP POST 到 ingestion 端点
//! - 队列通道：IngestionRequest 发布到消息代理
//! - 隔离通道故障，不向调用方抛出

pub mod broker;
pub mod channels;
pub mod error;
pub mod metrics;
pub mod router;
pub mod transport;

pub use broker::{AmqpBroker, InMemoryBroker};
pub use channels::{Channel, DirectChannel, QueuedChannel};
pub use contracts::{BrokerMessage, MessageBroker};
pub use error::DispatcherError;
pub use metrics::{DeliveryMetrics, MetricsSnapshot};
pub use router::{create_router, DeliveryOutcome, DeliveryRouter};
pub use transport::{ClientProfile, HttpTransport};
