use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

#[derive(Clone, Debug)]
pub enum Event {
    Key(KeyEvent),
    Tick,
    Resize,
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    _task: tokio::task::JoinHandle<()>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Event>();

        let task = tokio::spawn(async move {
            let mut reader = event::EventStream::new();
            let mut tick_interval = tick_interval(tick_rate);
            // the first tick completes immediately; the app already sampled once
            tick_interval.tick().await;

            loop {
                tokio::select! {
                    maybe_event = reader.next() => {
                        match maybe_event {
                            Some(Ok(evt)) => {
                                let mapped = match evt {
                                    CrosstermEvent::Key(key) => Some(Event::Key(key)),
                                    CrosstermEvent::Resize(_, _) => Some(Event::Resize),
                                    _ => None,
                                };
                                if let Some(e) = mapped
                                    && tx.send(e).is_err()
                                {
                                    break;
                                }
                            }
                            Some(Err(_)) => break,
                            None => break,
                        }
                    }
                    _ = tick_interval.tick() => {
                        if tx.send(Event::Tick).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self { rx, _task: task }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// Ticks missed while a slow cycle blocked the runtime are not replayed.
fn tick_interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "current_thread")]
    async fn late_ticks_are_delayed_not_burst() {
        let mut interval = tick_interval(Duration::from_millis(20));
        assert_eq!(interval.missed_tick_behavior(), MissedTickBehavior::Delay);

        interval.tick().await;
        std::thread::sleep(Duration::from_millis(70));
        // one overdue tick fires, then the next waits a full period
        interval.tick().await;
        let start = tokio::time::Instant::now();
        interval.tick().await;
        assert!(start.elapsed() >= Duration::from_millis(15));
    }
}
