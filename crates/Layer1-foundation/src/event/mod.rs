//! Event System - 재생 가능한 발행/구독 채널
//!
//! 플러그인 매니저와 각 플러그인의 라이프사이클 컨트롤러가 하나씩 내장합니다.
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       EventBus<E>                            │
//! │  publish(event) ──┬──▶ replay ring (last N)                  │
//! │                   └──▶ broadcast (N + extra capacity)        │
//! │                              │                               │
//! │         ┌────────────────────┼────────────────────┐          │
//! │         ▼                    ▼                    ▼          │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐        │
//! │  │ Subscriber 1 │  │ Subscriber 2 │  │ Subscriber N │        │
//! │  │ (monitor)    │  │ (UI)         │  │ (forwarder)  │        │
//! │  └──────────────┘  └──────────────┘  └──────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod bus;

pub use bus::{EventBus, EventBusConfig, EventSubscription};
