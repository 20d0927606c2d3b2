use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::Sender,
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Start,
    TogglePause,
    SingleStep,
    Inspect(i32),
    Redraw,
    Quit,
}

pub(crate) fn map_key(key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Command::Quit),
            KeyCode::Char('l') => Some(Command::Redraw),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char(' ') | KeyCode::Enter => Some(Command::Start),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Command::TogglePause),
        KeyCode::Char('n') | KeyCode::Char('N') => Some(Command::SingleStep),
        KeyCode::Tab => Some(Command::Inspect(1)),
        KeyCode::BackTab => Some(Command::Inspect(-1)),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
        _ => None,
    }
}

/// Reads terminal events on a background thread and forwards them as
/// commands. Stops when `stop` is set or the receiver is gone.
pub(crate) struct InputThread {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InputThread {
    pub(crate) fn spawn(tx: Sender<Command>) -> anyhow::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("input".into())
            .spawn(move || {
                if let Err(e) = pump(&tx, &flag) {
                    log::error!("input thread: {e}");
                    let _ = tx.send(Command::Quit);
                }
            })?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub(crate) fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

impl Drop for InputThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn pump(tx: &Sender<Command>, stop: &AtomicBool) -> std::io::Result<()> {
    while !stop.load(Ordering::Relaxed) {
        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let cmd = match event::read()? {
            Event::Key(k) => map_key(k),
            Event::Resize(_, _) => Some(Command::Redraw),
            _ => None,
        };
        if let Some(cmd) = cmd {
            if tx.send(cmd).is_err() {
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn start_keys() {
        assert_eq!(map_key(press(KeyCode::Char(' '), KeyModifiers::NONE)), Some(Command::Start));
        assert_eq!(map_key(press(KeyCode::Enter, KeyModifiers::NONE)), Some(Command::Start));
    }

    #[test]
    fn inspect_cycles_both_ways() {
        assert_eq!(
            map_key(press(KeyCode::Tab, KeyModifiers::NONE)),
            Some(Command::Inspect(1))
        );
        assert_eq!(
            map_key(press(KeyCode::BackTab, KeyModifiers::SHIFT)),
            Some(Command::Inspect(-1))
        );
    }

    #[test]
    fn control_chords() {
        let ctrl = |c| map_key(press(KeyCode::Char(c), KeyModifiers::CONTROL));
        assert_eq!(ctrl('c'), Some(Command::Quit));
        assert_eq!(ctrl('l'), Some(Command::Redraw));
        assert_eq!(ctrl('p'), None);
    }

    #[test]
    fn releases_are_ignored() {
        let mut k = press(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(map_key(k), Some(Command::Quit));
        k.kind = KeyEventKind::Release;
        assert_eq!(map_key(k), None);
    }
}
