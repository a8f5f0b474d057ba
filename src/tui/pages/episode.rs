use anyhow::Result;
use chrono::Locale;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};
use std::sync::Arc;

use super::PageAction;
use crate::api::{map_episode, Episode, EpisodeApi};
use crate::helpers::description_to_text;
use crate::player::PlayerState;
use crate::settings::SettingsManager;
use crate::theme::ThemeManager;

pub struct EpisodePage {
    api: Arc<dyn EpisodeApi>,
    locale: Locale,

    episode: Option<Episode>,
    description: String,
    scroll: u16,
    loading: bool,
    error_message: Option<String>,

    theme_manager: ThemeManager,
}

impl EpisodePage {
    pub fn new(api: Arc<dyn EpisodeApi>, settings: &SettingsManager) -> Self {
        let mut theme_manager = ThemeManager::new();
        theme_manager.set_theme(settings.theme_name());

        Self {
            api,
            locale: settings.locale(),
            episode: None,
            description: String::new(),
            scroll: 0,
            loading: false,
            error_message: None,
            theme_manager,
        }
    }

    pub fn episode(&self) -> Option<&Episode> {
        self.episode.as_ref()
    }

    /// Fetches one episode. A record with an unreadable date fails the page.
    pub async fn load(&mut self, id: &str) -> Result<()> {
        self.loading = true;
        self.error_message = None;
        self.episode = None;
        self.description.clear();
        self.scroll = 0;

        let result = match self.api.episode(id).await {
            Ok(raw) => map_episode(raw, self.locale),
            Err(e) => Err(e),
        };
        self.loading = false;

        match result {
            Ok(episode) => {
                log::info!("Opened episode {}", episode.id);
                self.description = episode
                    .description
                    .as_deref()
                    .map(description_to_text)
                    .unwrap_or_default();
                self.episode = Some(episode);
                Ok(())
            }
            Err(e) => {
                self.error_message = Some(format!("Failed to load episode: {}", e));
                Err(e.into())
            }
        }
    }

    /// Reloads the episode currently on screen.
    pub async fn refresh(&mut self) -> Result<()> {
        match self.episode.as_ref().map(|episode| episode.id.clone()) {
            Some(id) => self.load(&id).await,
            None => Ok(()),
        }
    }

    pub fn handle_input(&mut self, key: KeyEvent, player: &mut PlayerState) -> PageAction {
        match key.code {
            KeyCode::Esc | KeyCode::Backspace => return PageAction::Back,
            KeyCode::Char('p') | KeyCode::Enter => {
                if let Some(episode) = &self.episode {
                    player.play(episode.clone());
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll = self.scroll.saturating_add(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll = self.scroll.saturating_sub(1);
            }
            _ => {}
        }
        PageAction::None
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, player: &PlayerState) {
        let theme_colors = self.theme_manager.get_colors();

        let Some(episode) = &self.episode else {
            let (text, color) = if self.loading {
                ("🔄 Loading episode...".to_string(), theme_colors.accent)
            } else if let Some(error) = &self.error_message {
                (format!("❌ {}\n\nPress Esc to go back", error), theme_colors.error)
            } else {
                ("No episode selected".to_string(), theme_colors.text_secondary)
            };
            let placeholder = Paragraph::new(text)
                .style(Style::default().fg(color))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .title("Episode")
                        .title_alignment(Alignment::Center)
                        .border_style(Style::default().fg(color)),
                );
            frame.render_widget(placeholder, area);
            return;
        };

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(6), // Title and metadata
                Constraint::Min(3),    // Description
                Constraint::Length(3), // Controls
            ])
            .split(area);

        let is_current = player
            .current_episode()
            .is_some_and(|current| current.same_track(episode));
        let status = match (is_current, player.is_playing()) {
            (true, true) => "▶ Playing",
            (true, false) => "⏸ Paused",
            _ => "",
        };

        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                episode.title.clone(),
                Style::default().fg(theme_colors.text).add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::styled(episode.members.clone(), Style::default().fg(theme_colors.primary)),
                Span::styled(
                    format!("  ·  {}  ·  {}", episode.published_at, episode.duration_as_string),
                    Style::default().fg(theme_colors.text_secondary),
                ),
            ]),
            Line::from(Span::styled(
                episode.thumbnail.clone(),
                Style::default().fg(theme_colors.text_secondary).add_modifier(Modifier::ITALIC),
            )),
            Line::from(Span::styled(status, Style::default().fg(theme_colors.accent))),
        ])
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title("🎙 Episode")
                .border_style(Style::default().fg(theme_colors.border))
                .title_style(Style::default().fg(theme_colors.primary).add_modifier(Modifier::BOLD)),
        );
        frame.render_widget(header, layout[0]);

        let description = if self.description.is_empty() {
            "No description available."
        } else {
            self.description.as_str()
        };
        let body = Paragraph::new(description)
            .style(Style::default().fg(theme_colors.text))
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title("Description")
                    .border_style(Style::default().fg(theme_colors.border)),
            );
        frame.render_widget(body, layout[1]);

        let controls = [("p/Enter", "Play episode"), ("↑↓", "Scroll"), ("Esc", "Back")];
        let spans: Vec<Span> = controls
            .iter()
            .flat_map(|(key, desc)| {
                vec![
                    Span::styled(*key, Style::default().fg(theme_colors.primary).add_modifier(Modifier::BOLD)),
                    Span::styled(format!(" {}  ", desc), Style::default().fg(theme_colors.text_secondary)),
                ]
            })
            .collect();
        let footer = Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(theme_colors.border)),
            );
        frame.render_widget(footer, layout[2]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::tests::StaticApi;
    use crate::api::episodes::tests::raw;
    use crossterm::event::KeyModifiers;
    use std::path::PathBuf;

    fn page(api: StaticApi) -> EpisodePage {
        let settings = SettingsManager::with_path(PathBuf::from("/nonexistent/podcastr/settings.json"));
        EpisodePage::new(Arc::new(api), &settings)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn loads_episode_and_plain_text_description() {
        let mut page = page(StaticApi::with(vec![raw("a", 3661, "2021-01-08 16:00:00")]));
        page.load("a").await.unwrap();

        let episode = page.episode().unwrap();
        assert_eq!(episode.duration_as_string, "01:01:01");
        assert_eq!(page.description, "About things");
    }

    #[tokio::test]
    async fn play_replaces_the_queue_with_this_episode() {
        let mut page = page(StaticApi::with(vec![raw("a", 60, "2021-01-08 16:00:00")]));
        page.load("a").await.unwrap();

        let mut player = PlayerState::new();
        player.play_list(vec![crate::api::episodes::tests::episode("x")], 0);

        assert_eq!(page.handle_input(key(KeyCode::Char('p')), &mut player), PageAction::None);
        assert_eq!(player.episodes().len(), 1);
        assert_eq!(player.current_episode().map(|e| e.id.as_str()), Some("a"));
    }

    #[tokio::test]
    async fn unreadable_date_fails_the_page() {
        let mut page = page(StaticApi::with(vec![raw("a", 60, "not a date")]));
        assert!(page.load("a").await.is_err());
        assert!(page.episode().is_none());

        let mut player = PlayerState::new();
        page.handle_input(key(KeyCode::Enter), &mut player);
        assert!(player.episodes().is_empty());
    }

    #[tokio::test]
    async fn missing_episode_reports_error() {
        let mut page = page(StaticApi::default());
        assert!(page.load("ghost").await.is_err());
        assert!(page.error_message.as_deref().unwrap_or_default().contains("404"));
    }

    #[test]
    fn escape_goes_back_and_scroll_stops_at_top() {
        let mut page = page(StaticApi::default());
        let mut player = PlayerState::new();

        page.handle_input(key(KeyCode::Up), &mut player);
        assert_eq!(page.scroll, 0);
        page.handle_input(key(KeyCode::Down), &mut player);
        assert_eq!(page.scroll, 1);

        assert_eq!(page.handle_input(key(KeyCode::Esc), &mut player), PageAction::Back);
        assert_eq!(page.handle_input(key(KeyCode::Backspace), &mut player), PageAction::Back);
    }
}
