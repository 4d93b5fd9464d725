use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global quit, works in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_settings {
        handle_settings_key(app, key);
    } else {
        handle_chat_key(app, key);
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            app.submit_input();
        }

        // Mode selector: image <-> video
        KeyCode::Tab => {
            app.toggle_mode();
        }

        // Settings overlay
        KeyCode::Char('o') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.open_settings();
        }

        // Chat scrolling
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::PageDown => app.scroll_half_page_down(),

        // Input line editing
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
            app.input.insert(byte_pos, c);
            app.input_cursor += 1;
        }

        _ => {}
    }
}

fn handle_settings_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.close_settings();
        }
        KeyCode::Enter => {
            app.confirm_settings();
        }

        // Restore the built-in default into the edit buffer
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.reset_settings();
        }

        KeyCode::Backspace => {
            if app.settings_cursor > 0 {
                app.settings_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.settings_input, app.settings_cursor);
                app.settings_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.settings_input.chars().count();
            if app.settings_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.settings_input, app.settings_cursor);
                app.settings_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.settings_cursor = app.settings_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.settings_input.chars().count();
            app.settings_cursor = (app.settings_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.settings_cursor = 0;
        }
        KeyCode::End => {
            app.settings_cursor = app.settings_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.settings_input, app.settings_cursor);
            app.settings_input.insert(byte_pos, c);
            app.settings_cursor += 1;
        }

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taclink_core::{Config, Mode};

    fn app() -> App {
        let config = Config {
            endpoint_url: "http://127.0.0.1:1/hook".to_string(),
        };
        App::new(config, None, Mode::Image).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn press_ctrl(app: &mut App, c: char) {
        handle_key(app, KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
    }

    #[test]
    fn test_typing_edits_input_at_cursor() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.input, "abc");
        assert_eq!(app.input_cursor, 2);
    }

    #[test]
    fn test_backspace_handles_utf8() {
        let mut app = app();
        press(&mut app, KeyCode::Char('é'));
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.input, "x");
        assert_eq!(app.input_cursor, 0);
    }

    #[test]
    fn test_tab_toggles_mode() {
        let mut app = app();
        assert_eq!(app.engine.mode(), Mode::Image);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.engine.mode(), Mode::Video);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.engine.mode(), Mode::Image);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = app();
        press_ctrl(&mut app, 'c');
        assert!(app.should_quit);
    }

    #[test]
    fn test_settings_overlay_edit_and_cancel() {
        let mut app = app();
        press_ctrl(&mut app, 'o');
        assert!(app.show_settings);
        assert_eq!(app.settings_input, "http://127.0.0.1:1/hook");

        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Esc);
        assert!(!app.show_settings);
        // Cancel keeps the active endpoint untouched
        assert_eq!(app.engine.endpoint_url(), "http://127.0.0.1:1/hook");
    }

    #[test]
    fn test_settings_reset_fills_default_without_saving() {
        let mut app = app();
        press_ctrl(&mut app, 'o');
        press_ctrl(&mut app, 'r');
        assert_eq!(app.settings_input, taclink_core::DEFAULT_ENDPOINT);
        // Still only the seed message; reset alone records nothing
        assert_eq!(app.engine.messages().len(), 1);
    }
}
