//! Event Bus - 재생 가능한 이벤트 브로드캐스트
//!
//! 최근 N개의 이벤트를 링 버퍼에 보관하고, 추가 버퍼 용량을 가진
//! broadcast 채널로 구독자에게 전달합니다.
//!
//! ## 오버플로 정책
//!
//! - 발행(`publish`)은 절대 블록되지 않습니다.
//! - 채널 용량(`replay_size + extra_capacity`)보다 뒤처진 구독자는
//!   가장 오래된 이벤트를 잃습니다 (drop-oldest, 구독자별).
//! - 유실은 `warn!`으로 기록되고 수신은 다음 이벤트부터 계속됩니다.

use futures::Stream;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{trace, warn};

// ============================================================================
// EventBusConfig
// ============================================================================

/// 이벤트 버스 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventBusConfig {
    /// 재생 버퍼 크기 (새 구독자에게 다시 보내는 최근 이벤트 수)
    pub replay_size: usize,

    /// 재생 버퍼 외 추가 채널 용량
    pub extra_capacity: usize,
}

impl EventBusConfig {
    /// 채널 전체 용량
    pub fn channel_capacity(&self) -> usize {
        (self.replay_size + self.extra_capacity).max(1)
    }
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            replay_size: 100,
            extra_capacity: 1024,
        }
    }
}

// ============================================================================
// EventBus
// ============================================================================

/// 이벤트 버스
///
/// ## 사용법
///
/// ```ignore
/// let bus: EventBus<MyEvent> = EventBus::new();
///
/// // 과거 이벤트 + 실시간 이벤트 구독
/// let mut sub = bus.subscribe_with_replay();
///
/// bus.publish(MyEvent::Started);
///
/// while let Some(event) = sub.recv().await {
///     // ...
/// }
/// ```
pub struct EventBus<E> {
    /// 설정
    config: EventBusConfig,

    /// 브로드캐스트 채널 송신자
    sender: broadcast::Sender<E>,

    /// 재생 버퍼 (최근 N개)
    history: Mutex<VecDeque<E>>,

    /// 발행된 이벤트 수
    event_count: AtomicU64,
}

impl<E: Clone + Send + 'static> EventBus<E> {
    /// 기본 설정으로 이벤트 버스 생성
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// 커스텀 설정으로 이벤트 버스 생성
    pub fn with_config(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity());

        Self {
            history: Mutex::new(VecDeque::with_capacity(config.replay_size)),
            config,
            sender,
            event_count: AtomicU64::new(0),
        }
    }

    /// 이벤트 발행
    ///
    /// 재생 버퍼 갱신과 채널 전송은 같은 임계 구역에서 수행되므로
    /// `subscribe_with_replay`의 재생분과 실시간분 사이에 누락이나 중복이 없습니다.
    pub fn publish(&self, event: E) {
        let mut history = self.history.lock();

        if self.config.replay_size > 0 {
            if history.len() >= self.config.replay_size {
                history.pop_front();
            }
            history.push_back(event.clone());
        }

        // 구독자가 없어도 OK
        let _ = self.sender.send(event);
        let count = self.event_count.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(event_count = count, "Published event");
    }

    /// 실시간 이벤트만 구독
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }

    /// 재생 버퍼 + 실시간 이벤트 구독
    pub fn subscribe_with_replay(&self) -> EventSubscription<E> {
        let history = self.history.lock();
        let receiver = self.sender.subscribe();

        EventSubscription {
            replay: history.iter().cloned().collect(),
            receiver,
        }
    }

    /// 재생 버퍼 내용 (오래된 것 → 최신 순)
    pub fn history(&self) -> Vec<E> {
        self.history.lock().iter().cloned().collect()
    }

    /// 재생 버퍼 비우기
    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    /// 총 발행된 이벤트 수
    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::SeqCst)
    }

    /// 현재 구독자 수
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// 설정
    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }
}

impl<E: Clone + Send + 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// EventSubscription
// ============================================================================

/// 재생 버퍼를 먼저 내보낸 뒤 실시간 이벤트를 이어서 내보내는 구독
pub struct EventSubscription<E> {
    replay: VecDeque<E>,
    receiver: broadcast::Receiver<E>,
}

impl<E: Clone + Send + 'static> EventSubscription<E> {
    /// 다음 이벤트 수신 (버스가 닫히면 None)
    pub async fn recv(&mut self) -> Option<E> {
        if let Some(event) = self.replay.pop_front() {
            return Some(event);
        }

        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event subscriber lagged behind, oldest events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// 대기 없이 다음 이벤트 수신
    pub fn try_recv(&mut self) -> Option<E> {
        if let Some(event) = self.replay.pop_front() {
            return Some(event);
        }

        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event subscriber lagged behind, oldest events dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// 아직 전달되지 않은 재생 이벤트 수
    pub fn pending_replay(&self) -> usize {
        self.replay.len()
    }

    /// 스트림으로 변환
    pub fn into_stream(self) -> impl Stream<Item = E> + Send {
        let mut subscription = self;
        async_stream::stream! {
            while let Some(event) = subscription.recv().await {
                yield event;
            }
        }
    }
}

// ============================================================================
// 테스트
// ============================================================================
