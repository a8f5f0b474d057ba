use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::audio::MediaBackend;
use crate::error::AudioError;
use crate::helpers::format_duration;
use crate::player::{PlayerState, PlayerView};
use crate::theme::ThemeManager;

const VOLUME_STEP: f32 = 0.1;

/// The always-visible player on the right of the screen.
pub struct PlayerPanel {
    theme_manager: ThemeManager,
}

impl PlayerPanel {
    pub fn new(theme_name: &str) -> Self {
        let mut theme_manager = ThemeManager::new();
        theme_manager.set_theme(theme_name);
        Self { theme_manager }
    }

    /// Handles the player keys. Returns `Ok(false)` when the key is not a
    /// player key. Controls that are disabled on screen do nothing.
    pub fn handle_input(
        &self,
        key: KeyEvent,
        player: &mut PlayerState,
        view: &mut PlayerView,
        backend: &dyn MediaBackend,
    ) -> Result<bool, AudioError> {
        let has_episode = player.current_episode().is_some();

        match key.code {
            KeyCode::Char(' ') => {
                if has_episode {
                    player.toggle_play();
                }
            }
            KeyCode::Char('n') => {
                if player.has_next() {
                    player.play_next();
                }
            }
            KeyCode::Char('b') => {
                if player.has_previous() {
                    player.play_previous();
                }
            }
            KeyCode::Char('s') => {
                if has_episode {
                    player.toggle_shuffle();
                }
            }
            KeyCode::Char('l') => {
                if has_episode {
                    player.toggle_loop();
                }
            }
            KeyCode::Right => view.skip_forward(backend)?,
            KeyCode::Left => view.skip_backward(backend)?,
            KeyCode::Char(digit @ '0'..='9') => {
                let tenths = digit.to_digit(10).unwrap_or(0);
                view.seek_to_fraction(f64::from(tenths) / 10.0, backend)?;
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                view.set_volume(view.volume() + VOLUME_STEP, backend)?;
            }
            KeyCode::Char('-') => {
                view.set_volume(view.volume() - VOLUME_STEP, backend)?;
            }
            _ => return Ok(false),
        }

        Ok(true)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, player: &PlayerState, view: &PlayerView) {
        let theme_colors = self.theme_manager.get_colors();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title("🎧 Playing now")
            .title_style(
                Style::default()
                    .fg(theme_colors.player_background)
                    .add_modifier(Modifier::BOLD),
            )
            .border_style(Style::default().fg(theme_colors.player_background));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Episode
                Constraint::Length(1), // Progress
                Constraint::Length(1),
                Constraint::Length(1), // Buttons
                Constraint::Length(1), // Key hints
                Constraint::Length(2), // Playback error
            ])
            .split(inner);

        self.render_episode(frame, layout[0], player);
        self.render_progress(frame, layout[1], player, view);
        self.render_buttons(frame, layout[3], player);
        self.render_hints(frame, layout[4], view);

        if let Some(error) = view.last_error() {
            let error = Paragraph::new(format!("❌ {}", error))
                .style(Style::default().fg(theme_colors.error))
                .wrap(Wrap { trim: true });
            frame.render_widget(error, layout[5]);
        }
    }

    fn render_episode(&self, frame: &mut Frame, area: Rect, player: &PlayerState) {
        let theme_colors = self.theme_manager.get_colors();

        let Some(episode) = player.current_episode() else {
            let empty = Paragraph::new("\nSelect a podcast to listen")
                .style(
                    Style::default()
                        .fg(theme_colors.text_secondary)
                        .add_modifier(Modifier::ITALIC),
                )
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(Style::default().fg(theme_colors.player_rail)),
                );
            frame.render_widget(empty, area);
            return;
        };

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                episode.title.clone(),
                Style::default().fg(theme_colors.text).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                episode.members.clone(),
                Style::default().fg(theme_colors.text_secondary),
            )),
        ];
        if player.episodes().len() > 1 {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("{} of {} in queue", player.current_index() + 1, player.episodes().len()),
                Style::default().fg(theme_colors.text_secondary),
            )));
        }

        let info = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(info, area);
    }

    fn render_progress(&self, frame: &mut Frame, area: Rect, player: &PlayerState, view: &PlayerView) {
        let theme_colors = self.theme_manager.get_colors();

        // Until the backend reports a length, fall back to the listed duration
        let total = match (view.track_length(), player.current_episode()) {
            (0, Some(episode)) => episode.duration,
            (length, _) => length,
        };
        let elapsed = if player.current_episode().is_some() {
            view.progress()
        } else {
            0
        };
        let ratio = if total > 0 {
            (elapsed as f64 / total as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(9),
                Constraint::Min(3),
                Constraint::Length(9),
            ])
            .split(area);

        let text_style = Style::default().fg(theme_colors.text_secondary);
        frame.render_widget(
            Paragraph::new(format_duration(elapsed)).style(text_style),
            layout[0],
        );
        frame.render_widget(
            Gauge::default()
                .gauge_style(
                    Style::default()
                        .fg(theme_colors.player_track)
                        .bg(theme_colors.player_rail),
                )
                .ratio(ratio)
                .label("")
                .use_unicode(true),
            layout[1],
        );
        frame.render_widget(
            Paragraph::new(format_duration(total))
                .style(text_style)
                .alignment(Alignment::Right),
            layout[2],
        );
    }

    fn render_buttons(&self, frame: &mut Frame, area: Rect, player: &PlayerState) {
        let has_episode = player.current_episode().is_some();
        let play_icon = if player.is_playing() { "⏸" } else { "▶" };

        let buttons = vec![
            Span::styled("🔀", self.button_style(has_episode, player.is_shuffling())),
            Span::raw("   "),
            Span::styled("⏮", self.button_style(player.has_previous(), false)),
            Span::raw("   "),
            Span::styled(format!(" {} ", play_icon), self.play_button_style(has_episode)),
            Span::raw("   "),
            Span::styled("⏭", self.button_style(player.has_next(), false)),
            Span::raw("   "),
            Span::styled("🔁", self.button_style(has_episode, player.is_looping())),
        ];

        frame.render_widget(
            Paragraph::new(Line::from(buttons)).alignment(Alignment::Center),
            area,
        );
    }

    fn render_hints(&self, frame: &mut Frame, area: Rect, view: &PlayerView) {
        let theme_colors = self.theme_manager.get_colors();
        let key_style = Style::default().fg(theme_colors.primary).add_modifier(Modifier::BOLD);
        let text_style = Style::default().fg(theme_colors.text_secondary);

        let hints = Line::from(vec![
            Span::styled("s", key_style),
            Span::styled(" b ", key_style),
            Span::styled("Space", key_style),
            Span::styled(" n ", key_style),
            Span::styled("l", key_style),
            Span::styled(format!("  ←→ ±{}s", view.skip_interval()), text_style),
            Span::styled(format!("  ± vol {:.0}%", view.volume() * 100.0), text_style),
        ]);

        frame.render_widget(Paragraph::new(hints).alignment(Alignment::Center), area);
    }

    fn button_style(&self, enabled: bool, active: bool) -> Style {
        let theme_colors = self.theme_manager.get_colors();
        if !enabled {
            Style::default()
                .fg(theme_colors.text_secondary)
                .add_modifier(Modifier::DIM)
        } else if active {
            Style::default()
                .fg(theme_colors.player_track)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme_colors.text)
        }
    }

    fn play_button_style(&self, enabled: bool) -> Style {
        let theme_colors = self.theme_manager.get_colors();
        if enabled {
            Style::default()
                .fg(theme_colors.container)
                .bg(theme_colors.player_rail)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(theme_colors.text_secondary)
                .add_modifier(Modifier::DIM)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::episodes::tests::episode;
    use crate::audio::AudioCommand;
    use crossterm::event::KeyModifiers;
    use ratatui::{backend::TestBackend, Terminal};
    use std::cell::RefCell;

    #[derive(Default)]
    struct SeekLog {
        commands: RefCell<Vec<AudioCommand>>,
    }

    impl MediaBackend for SeekLog {
        fn dispatch(&self, command: AudioCommand) -> Result<(), AudioError> {
            self.commands.borrow_mut().push(command);
            Ok(())
        }
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn screen(panel: &PlayerPanel, player: &PlayerState, view: &PlayerView) -> String {
        let mut terminal = Terminal::new(TestBackend::new(40, 16)).unwrap();
        terminal
            .draw(|frame| panel.render(frame, frame.area(), player, view))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn controls_do_nothing_without_an_episode() {
        let panel = PlayerPanel::new("Podcastr");
        let backend = SeekLog::default();
        let mut player = PlayerState::new();
        let mut view = PlayerView::default();

        for c in [' ', 'n', 'b', 's', 'l'] {
            assert!(panel.handle_input(key(c), &mut player, &mut view, &backend).unwrap());
        }
        panel
            .handle_input(KeyEvent::new(KeyCode::Right, KeyModifiers::NONE), &mut player, &mut view, &backend)
            .unwrap();

        assert_eq!(player, PlayerState::new());
        assert!(backend.commands.borrow().is_empty());
    }

    #[test]
    fn next_and_previous_respect_the_queue_ends() {
        let panel = PlayerPanel::new("Podcastr");
        let backend = SeekLog::default();
        let mut view = PlayerView::default();
        let mut player = PlayerState::new();
        player.play_list(vec![episode("a"), episode("b")], 0);

        panel.handle_input(key('b'), &mut player, &mut view, &backend).unwrap();
        assert_eq!(player.current_index(), 0);

        panel.handle_input(key('n'), &mut player, &mut view, &backend).unwrap();
        assert_eq!(player.current_index(), 1);

        panel.handle_input(key('n'), &mut player, &mut view, &backend).unwrap();
        assert_eq!(player.current_index(), 1);
    }

    #[test]
    fn toggles_flip_player_flags() {
        let panel = PlayerPanel::new("Podcastr");
        let backend = SeekLog::default();
        let mut view = PlayerView::default();
        let mut player = PlayerState::new();
        player.play(episode("a"));

        panel.handle_input(key(' '), &mut player, &mut view, &backend).unwrap();
        panel.handle_input(key('s'), &mut player, &mut view, &backend).unwrap();
        panel.handle_input(key('l'), &mut player, &mut view, &backend).unwrap();

        assert!(!player.is_playing());
        assert!(player.is_shuffling());
        assert!(player.is_looping());
    }

    #[test]
    fn volume_keys_step_and_clamp() {
        let panel = PlayerPanel::new("Podcastr");
        let backend = SeekLog::default();
        let mut player = PlayerState::new();
        let mut view = PlayerView::default().with_volume(0.95);

        panel.handle_input(key('+'), &mut player, &mut view, &backend).unwrap();
        assert_eq!(view.volume(), 1.0);

        panel.handle_input(key('-'), &mut player, &mut view, &backend).unwrap();
        assert!((view.volume() - 0.9).abs() < 1e-6);
        assert_eq!(backend.commands.borrow().len(), 2);
    }

    #[test]
    fn other_keys_are_left_for_the_page() {
        let panel = PlayerPanel::new("Podcastr");
        let mut player = PlayerState::new();
        let mut view = PlayerView::default();
        assert!(!panel
            .handle_input(key('p'), &mut player, &mut view, &SeekLog::default())
            .unwrap());
    }

    #[test]
    fn empty_player_prompts_for_a_selection() {
        let panel = PlayerPanel::new("Podcastr");
        let text = screen(&panel, &PlayerState::new(), &PlayerView::default());

        assert!(text.contains("Playing now"));
        assert!(text.contains("Select a podcast to listen"));
        assert!(text.contains("00:00:00"));
    }

    #[test]
    fn shows_current_episode_and_listed_duration() {
        let panel = PlayerPanel::new("Dark");
        let mut player = PlayerState::new();
        player.play_list(vec![episode("a"), episode("b")], 1);

        let text = screen(&panel, &player, &PlayerView::default());
        assert!(text.contains("Episode b"));
        assert!(text.contains("Diego e Richard"));
        assert!(text.contains("00:01:01"));
        assert!(text.contains("2 of 2 in queue"));
    }
}
