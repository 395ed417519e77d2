use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::action::Action;
use crate::error::Result;
use crate::render::dashboard::theme::Theme;
use crate::system::collector::Collector;
use crate::system::history::UtilizationHistory;
use crate::system::snapshot::UtilizationSnapshot;
use crate::system::store::SampleStore;

const STATUS_MESSAGE_SECS: u64 = 3;

/// Dashboard state. Every refresh is one synchronous sampling cycle.
pub struct App {
    pub running: bool,
    collector: Collector<Box<dyn SampleStore>>,
    pub snapshot: UtilizationSnapshot,
    pub history: UtilizationHistory,
    pub theme: Theme,
    pub refresh_rate_ms: u64,
    status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(mut collector: Collector<Box<dyn SampleStore>>, refresh_rate_ms: u64) -> Result<Self> {
        let snapshot = collector.sample()?;
        let mut history = UtilizationHistory::default();
        history.record(&snapshot);

        Ok(App {
            running: true,
            collector,
            snapshot,
            history,
            theme: Theme::detect(),
            refresh_rate_ms,
            status_message: None,
        })
    }

    pub fn refresh_data(&mut self) -> Result<()> {
        self.snapshot = self.collector.sample()?;
        self.history.record(&self.snapshot);

        if let Some((_, created)) = &self.status_message
            && created.elapsed().as_secs() >= STATUS_MESSAGE_SECS
        {
            self.status_message = None;
        }
        Ok(())
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_ref().map(|(msg, _)| msg.as_str())
    }

    pub fn map_key(&self, key: KeyEvent) -> Action {
        // Ctrl+C always quits
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('r') => Action::Refresh,
            _ => Action::None,
        }
    }

    pub fn dispatch(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,
            Action::Refresh => {
                self.refresh_data()?;
                self.status_message = Some(("Refreshed".to_string(), Instant::now()));
            }
            Action::None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::system::gpu::GpuQuery;
    use crate::system::source::CounterSources;
    use crate::system::store::MemoryStore;

    pub(crate) struct FixtureDir(pub PathBuf);

    impl Drop for FixtureDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    pub(crate) fn fixture_app(name: &str, cores: usize) -> (App, FixtureDir) {
        let dir = std::env::temp_dir().join(format!("coremon_app_{}_{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut stat = String::from("cpu 0 0 0 0 0 0 0 0 0 0\n");
        for i in 0..cores {
            stat.push_str(&format!("cpu{i} 10 0 10 80 0 0 0 0 0 0\n"));
        }
        std::fs::write(dir.join("stat"), stat).unwrap();
        std::fs::write(
            dir.join("meminfo"),
            "MemTotal: 2097152 kB\nMemAvailable: 1048576 kB\n",
        )
        .unwrap();

        let sources = CounterSources {
            stat_path: dir.join("stat"),
            meminfo_path: dir.join("meminfo"),
            gpu: GpuQuery {
                enabled: false,
                command: String::new(),
                max_gpus: 0,
            },
        };
        let store: Box<dyn SampleStore> = Box::new(MemoryStore::default());
        let mut app = App::new(Collector::new(sources, store), 1000).unwrap();
        app.theme = Theme::dark();
        (app, FixtureDir(dir))
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn quit_keys() {
        let (app, _dir) = fixture_app("keys", 1);
        assert_eq!(app.map_key(key(KeyCode::Char('q'), KeyModifiers::NONE)), Action::Quit);
        assert_eq!(
            app.map_key(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(app.map_key(key(KeyCode::Char('c'), KeyModifiers::NONE)), Action::None);
        assert_eq!(
            app.map_key(key(KeyCode::Char('r'), KeyModifiers::NONE)),
            Action::Refresh
        );
    }

    #[test]
    fn refresh_records_history() {
        let (mut app, _dir) = fixture_app("refresh", 2);
        assert_eq!(app.history.average().len(), 1);
        app.dispatch(Action::Refresh).unwrap();
        assert_eq!(app.history.average().len(), 2);
        assert_eq!(app.status_message(), Some("Refreshed"));
        app.dispatch(Action::Quit).unwrap();
        assert!(!app.running);
    }
}
