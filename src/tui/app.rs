use anyhow::Result;
use chrono::{Local, Locale};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;

use super::pages::*;
use crate::api::{EpisodeApi, PodcastrClient};
use crate::audio::{AudioPlayer, MediaBackend, MediaEvent, MediaUpdate};
use crate::helpers::format_today;
use crate::player::{PlayerState, PlayerView};
use crate::settings::SettingsManager;
use crate::theme::ThemeManager;

const MESSAGE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppPage {
    Home,
    Episode,
}

impl AppPage {
    pub fn title(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Episode => "Episode",
        }
    }
}

pub struct TuiApp {
    // Core state
    active_page: AppPage,
    should_quit: bool,
    locale: Locale,

    // Playback
    player_state: PlayerState,
    player_view: PlayerView,
    backend: Box<dyn MediaBackend>,
    media_events: UnboundedReceiver<MediaUpdate>,

    // Pages
    home_page: HomePage,
    episode_page: EpisodePage,
    player_panel: PlayerPanel,

    // UI state
    error_message: Option<String>,
    success_message: Option<String>,
    message_timeout: Option<Instant>,

    // Theme management
    theme_manager: ThemeManager,
}

impl TuiApp {
    /// Builds the app against the configured API and the default audio
    /// output. Must be called from within a tokio runtime.
    pub fn new(settings_manager: SettingsManager) -> Result<Self> {
        let api: Arc<dyn EpisodeApi> = Arc::new(PodcastrClient::new(settings_manager.api_base_url()));
        log::info!("Using episode API at {}", settings_manager.api_base_url());

        let (audio_player, media_events) = AudioPlayer::new_with_device(
            settings_manager.selected_audio_device(),
            settings_manager.default_volume(),
        )?;

        Ok(Self::with_parts(
            settings_manager,
            api,
            Box::new(audio_player),
            media_events,
        ))
    }

    pub fn with_parts(
        settings_manager: SettingsManager,
        api: Arc<dyn EpisodeApi>,
        backend: Box<dyn MediaBackend>,
        media_events: UnboundedReceiver<MediaUpdate>,
    ) -> Self {
        let mut theme_manager = ThemeManager::new();
        theme_manager.set_theme(settings_manager.theme_name());

        Self {
            active_page: AppPage::Home,
            should_quit: false,
            locale: settings_manager.locale(),

            player_state: PlayerState::new(),
            player_view: PlayerView::new(settings_manager.skip_interval())
                .with_volume(settings_manager.default_volume()),
            backend,
            media_events,

            home_page: HomePage::new(api.clone(), &settings_manager),
            episode_page: EpisodePage::new(api, &settings_manager),
            player_panel: PlayerPanel::new(settings_manager.theme_name()),

            error_message: None,
            success_message: None,
            message_timeout: None,

            theme_manager,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn active_page(&self) -> AppPage {
        self.active_page
    }

    pub fn player_state(&self) -> &PlayerState {
        &self.player_state
    }

    pub fn player_view(&self) -> &PlayerView {
        &self.player_view
    }

    pub async fn initialize(&mut self) {
        if let Err(e) = self.home_page.initialize().await {
            log::error!("Initial load failed: {}", e);
            self.show_error_message(&e.to_string());
        }
    }

    pub async fn handle_input(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        // Global shortcuts
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) | (KeyModifiers::NONE, KeyCode::Char('q')) => {
                self.should_quit = true;
                return Ok(());
            }
            (KeyModifiers::CONTROL, KeyCode::Char('r')) => {
                self.refresh_current_page().await;
                return Ok(());
            }
            _ => {}
        }

        if self.error_message.is_some() || self.success_message.is_some() {
            self.clear_messages();
        }

        // Player controls work on every page
        match self
            .player_panel
            .handle_input(key, &mut self.player_state, &mut self.player_view, self.backend.as_ref())
        {
            Ok(true) => {
                self.sync_player();
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => {
                self.show_error_message(&format!("Failed to control playback: {}", e));
                return Ok(());
            }
        }

        // Forward input to active page
        let action = match self.active_page {
            AppPage::Home => self.home_page.handle_input(key, &mut self.player_state),
            AppPage::Episode => self.episode_page.handle_input(key, &mut self.player_state),
        };
        self.sync_player();

        match action {
            PageAction::None => {}
            PageAction::OpenEpisode(id) => {
                self.active_page = AppPage::Episode;
                if let Err(e) = self.episode_page.load(&id).await {
                    log::error!("Failed to open episode {}: {}", id, e);
                    self.show_error_message(&e.to_string());
                }
            }
            PageAction::Back => {
                self.active_page = AppPage::Home;
            }
        }

        Ok(())
    }

    pub async fn update(&mut self) -> Result<()> {
        // Clear expired messages
        if let Some(timeout) = self.message_timeout {
            if timeout.elapsed() >= MESSAGE_TIMEOUT {
                self.clear_messages();
            }
        }

        // Fold in whatever the audio task reported since the last tick
        while let Ok(update) = self.media_events.try_recv() {
            log::debug!("Media event: {:?}", update);
            let failure = match &update.event {
                MediaEvent::Failed(message) => Some(message.clone()),
                _ => None,
            };
            if self.player_view.handle_update(&mut self.player_state, update) {
                if let Some(message) = failure {
                    self.show_error_message(&format!("Playback failed: {}", message));
                }
            }
        }
        self.sync_player();

        if self.active_page == AppPage::Home {
            if let Err(e) = self.home_page.update().await {
                log::error!("Failed to revalidate episodes: {}", e);
                self.show_error_message(&e.to_string());
            }
        }

        Ok(())
    }

    fn sync_player(&mut self) {
        if let Err(e) = self.player_view.sync(&self.player_state, self.backend.as_ref()) {
            log::error!("Failed to sync player: {}", e);
            self.show_error_message(&format!("Audio unavailable: {}", e));
        }
    }

    async fn refresh_current_page(&mut self) {
        let result = match self.active_page {
            AppPage::Home => self.home_page.refresh().await,
            AppPage::Episode => self.episode_page.refresh().await,
        };

        match result {
            Ok(()) => self.show_success_message("Refreshed"),
            Err(e) => self.show_error_message(&format!("Refresh failed: {}", e)),
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let main_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(5),    // Content
                Constraint::Length(3), // Footer with shortcuts
            ])
            .split(frame.area());

        self.render_header(frame, main_layout[0]);

        let content_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(40),    // Active page
                Constraint::Length(42), // Player
            ])
            .split(main_layout[1]);

        match self.active_page {
            AppPage::Home => self
                .home_page
                .render(frame, content_layout[0], &self.player_state),
            AppPage::Episode => self
                .episode_page
                .render(frame, content_layout[0], &self.player_state),
        }
        self.player_panel
            .render(frame, content_layout[1], &self.player_state, &self.player_view);

        self.render_footer(frame, main_layout[2]);

        // Render messages overlay if needed
        self.render_messages_overlay(frame, frame.area());
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let theme_colors = self.theme_manager.get_colors();
        let today = format_today(Local::now().naive_local(), self.locale);

        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                "🎙 Podcastr",
                Style::default().fg(theme_colors.primary).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  │  ", Style::default().fg(theme_colors.border)),
            Span::styled(
                "The best for you to listen, always",
                Style::default().fg(theme_colors.text),
            ),
            Span::styled("  │  ", Style::default().fg(theme_colors.border)),
            Span::styled(today, Style::default().fg(theme_colors.text_secondary)),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(theme_colors.border))
                .title(format!(" {} ", self.active_page.title()))
                .title_style(Style::default().fg(theme_colors.accent)),
        );

        frame.render_widget(header, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let theme_colors = self.theme_manager.get_colors();
        let shortcuts = match self.active_page {
            AppPage::Home => vec![
                ("↑↓", "Select"),
                ("Enter", "Details"),
                ("p", "Play"),
                ("Ctrl+R", "Refresh"),
                ("q", "Quit"),
            ],
            AppPage::Episode => vec![
                ("p", "Play"),
                ("Esc", "Back"),
                ("Ctrl+R", "Refresh"),
                ("q", "Quit"),
            ],
        };

        let footer_text: Vec<Span> = shortcuts
            .iter()
            .enumerate()
            .flat_map(|(i, (key, desc))| {
                let mut spans = vec![
                    Span::styled(*key, Style::default().fg(theme_colors.primary).add_modifier(Modifier::BOLD)),
                    Span::styled(format!(" {}", desc), Style::default().fg(theme_colors.text_secondary)),
                ];

                if i < shortcuts.len() - 1 {
                    spans.push(Span::raw("  "));
                }

                spans
            })
            .collect();

        let footer = Paragraph::new(Line::from(footer_text))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(theme_colors.border))
                    .title("🔧 Controls")
                    .title_style(Style::default().fg(theme_colors.accent)),
            );

        frame.render_widget(footer, area);
    }

    fn render_messages_overlay(&self, frame: &mut Frame, area: Rect) {
        let theme_colors = self.theme_manager.get_colors();

        let message = if let Some(error) = &self.error_message {
            Some((format!("❌ {}", error), theme_colors.error, "Error"))
        } else {
            self.success_message
                .as_ref()
                .map(|success| (format!("✅ {}", success), theme_colors.success, "Success"))
        };

        if let Some((text, color, title)) = message {
            let popup_area = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Percentage(20),
                    Constraint::Length(6),
                    Constraint::Percentage(20),
                ])
                .split(area)[1];

            let popup_area = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Percentage(15),
                    Constraint::Percentage(70),
                    Constraint::Percentage(15),
                ])
                .split(popup_area)[1];

            frame.render_widget(Clear, popup_area);

            let message_widget = Paragraph::new(text)
                .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .title(format!("{} (Press any key to dismiss)", title))
                        .border_style(Style::default().fg(color))
                        .style(Style::default().bg(theme_colors.container)),
                );

            frame.render_widget(message_widget, popup_area);
        }
    }

    pub fn show_error_message(&mut self, message: &str) {
        self.error_message = Some(message.to_string());
        self.success_message = None;
        self.message_timeout = Some(Instant::now());
    }

    pub fn show_success_message(&mut self, message: &str) {
        self.success_message = Some(message.to_string());
        self.error_message = None;
        self.message_timeout = Some(Instant::now());
    }

    pub fn clear_messages(&mut self) {
        self.error_message = None;
        self.success_message = None;
        self.message_timeout = None;
    }
}
