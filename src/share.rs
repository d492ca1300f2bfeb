//! Game-over share card
//!
//! Summarizes a finished session as text and as a 600x600 image, then hands
//! both to the platform. Fallback chain:
//! 1. Native share sheet (text + image when supported)
//! 2. Clipboard copy of the text and a download of the image
//! 3. Whichever of the two still works
//!
//! Sharing never fails the game; the worst case is a notice telling the
//! player to share manually.

use glam::Vec2;

use crate::error::GameError;
use crate::renderer::scene;
use crate::renderer::surface::{Rgba, Surface, TextAlign};
use crate::sim::state::GameState;

/// Side length of the share image
pub const CARD_SIZE: f32 = 600.0;
/// File name offered for the image download
pub const IMAGE_FILE_NAME: &str = "space-shooter-score.png";

const CARD_ACCENT: Rgba = Rgba::hex(0x00ffaa);

/// Everything the share card shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareCard {
    pub score: u64,
    pub level: u32,
    pub enemies_killed: u32,
    pub power_ups_collected: u32,
    pub shots_fired: u32,
    pub survived_secs: u64,
    pub new_high_score: bool,
}

impl ShareCard {
    pub fn from_state(state: &GameState) -> Self {
        Self {
            score: state.player.score,
            level: state.player.level,
            enemies_killed: state.stats.enemies_killed,
            power_ups_collected: state.stats.power_ups_collected,
            shots_fired: state.stats.shots_fired,
            survived_secs: state.stats.survived_secs(state.now_ms),
            new_high_score: state.new_high_score,
        }
    }

    /// Text for share sheets and the clipboard
    pub fn share_text(&self) -> String {
        format!(
            "I just scored {} points in Space Shooter!\n\n\
             Level: {}\nEnemies: {}\nPower-ups: {}\n\n\
             Can you beat my score?",
            group_digits(self.score),
            self.level,
            self.enemies_killed,
            self.power_ups_collected
        )
    }
}

/// `12345` -> `"12,345"`
pub fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `65` -> `"1:05"`
pub fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Card-space placement
#[derive(Clone, Copy)]
struct Layout {
    origin: Vec2,
    scale: f32,
}

impl Layout {
    fn at(self, x: f32, y: f32) -> Vec2 {
        self.origin + Vec2::new(x, y) * self.scale
    }

    fn center(self, surface: &mut dyn Surface, text: &str, y: f32, size: f32, color: Rgba) {
        surface.text(text, self.at(CARD_SIZE / 2.0, y), size * self.scale, color, TextAlign::Center);
    }
}

/// Draw the card with its top-left corner at `origin`, scaled by `scale`
pub fn draw_card(surface: &mut dyn Surface, card: &ShareCard, origin: Vec2, scale: f32) {
    let layout = Layout { origin, scale };

    surface.fill_rect(origin, Vec2::splat(CARD_SIZE * scale), Rgba::hex(0x0a0a2e));
    for i in 0..50u32 {
        let pos = layout.at(scene::hash01(i * 2 + 7) * CARD_SIZE, scene::hash01(i * 2 + 8) * CARD_SIZE);
        let alpha = 0.2 + scene::hash01(i + 1000) * 0.8;
        surface.fill_circle(pos, (0.5 + scene::hash01(i + 2000) * 2.0) * scale, Rgba::WHITE.alpha(alpha));
    }

    surface.set_glow(CARD_ACCENT, 20.0);
    layout.center(surface, "SPACE SHOOTER", 120.0, 40.0, CARD_ACCENT);
    surface.set_glow(CARD_ACCENT, 0.0);

    surface.fill_rect(layout.at(150.0, 180.0), Vec2::new(300.0, 120.0) * scale, CARD_ACCENT.alpha(0.2));
    surface.stroke_rect(layout.at(150.0, 180.0), Vec2::new(300.0, 120.0) * scale, CARD_ACCENT, 3.0 * scale);
    layout.center(surface, &group_digits(card.score), 250.0, 56.0, Rgba::WHITE);
    layout.center(surface, "FINAL SCORE", 285.0, 24.0, CARD_ACCENT);

    let stats = [
        format!("Level Reached: {}", card.level),
        format!("Enemies Defeated: {}", card.enemies_killed),
        format!("Power-ups Collected: {}", card.power_ups_collected),
        format!("Time Survived: {}", format_duration(card.survived_secs)),
    ];
    for (i, line) in stats.iter().enumerate() {
        layout.center(surface, line, 340.0 + i as f32 * 30.0, 20.0, Rgba::WHITE);
    }

    if card.new_high_score {
        layout.center(surface, "NEW HIGH SCORE!", 480.0, 28.0, Rgba::hex(0xffd700));
    }
    layout.center(surface, "Can you beat this score?", 530.0, 16.0, Rgba::hex(0x888888));
}

/// Render the card onto a dedicated (offscreen) surface of `CARD_SIZE`
pub fn render_share_card(card: &ShareCard, surface: &mut dyn Surface) {
    let scale = surface.size().x.min(surface.size().y) / CARD_SIZE;
    draw_card(surface, card, Vec2::ZERO, scale);
}

/// How a share attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    CopiedAndDownloaded,
    Copied,
    Downloaded,
    /// Nothing worked; the player has to share by hand
    Manual,
}

impl ShareOutcome {
    /// Transient notice for the player
    pub fn notice(self) -> &'static str {
        match self {
            ShareOutcome::Shared => "Score shared successfully!",
            ShareOutcome::CopiedAndDownloaded => {
                "Score copied to clipboard! Image download started."
            }
            ShareOutcome::Copied => "Score copied to clipboard!",
            ShareOutcome::Downloaded => "Image download started! Share your score manually.",
            ShareOutcome::Manual => "Sharing is unavailable - share your score manually.",
        }
    }
}

/// Platform share capabilities
#[allow(async_fn_in_trait)]
pub trait ShareTarget {
    /// Encoded card image (data URL) if the platform can produce one
    fn card_image(&mut self, card: &ShareCard) -> Option<String>;
    /// Native share sheet
    async fn share_native(&mut self, text: &str, image: Option<&str>) -> Result<(), GameError>;
    async fn copy_text(&mut self, text: &str) -> Result<(), GameError>;
    fn download(&mut self, image: &str, file_name: &str) -> Result<(), GameError>;
}

/// Run the fallback chain; never returns an error
pub async fn share_with_fallback<T: ShareTarget>(card: &ShareCard, target: &mut T) -> ShareOutcome {
    let text = card.share_text();
    let image = target.card_image(card);

    match target.share_native(&text, image.as_deref()).await {
        Ok(()) => {
            log::info!("Score shared via share sheet");
            return ShareOutcome::Shared;
        }
        Err(e) => log::info!("Share sheet unavailable ({}), falling back", e),
    }

    let downloaded = match image.as_deref() {
        Some(image) => match target.download(image, IMAGE_FILE_NAME) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Image download failed: {}", e);
                false
            }
        },
        None => false,
    };
    let copied = match target.copy_text(&text).await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Clipboard copy failed: {}", e);
            false
        }
    };

    match (copied, downloaded) {
        (true, true) => ShareOutcome::CopiedAndDownloaded,
        (true, false) => ShareOutcome::Copied,
        (false, true) => ShareOutcome::Downloaded,
        (false, false) => ShareOutcome::Manual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::surface::RecordingSurface;
    use pollster::block_on;

    #[derive(Default)]
    struct FakeTarget {
        native: bool,
        clipboard: bool,
        image: bool,
        downloads: Vec<String>,
        copied: Vec<String>,
    }

    impl ShareTarget for FakeTarget {
        fn card_image(&mut self, _card: &ShareCard) -> Option<String> {
            self.image.then(|| "data:image/png;base64,AAAA".to_string())
        }

        async fn share_native(&mut self, _text: &str, _image: Option<&str>) -> Result<(), GameError> {
            if self.native {
                Ok(())
            } else {
                Err(GameError::ShareUnavailable)
            }
        }

        async fn copy_text(&mut self, text: &str) -> Result<(), GameError> {
            if self.clipboard {
                self.copied.push(text.to_string());
                Ok(())
            } else {
                Err(GameError::ClipboardUnavailable)
            }
        }

        fn download(&mut self, _image: &str, file_name: &str) -> Result<(), GameError> {
            self.downloads.push(file_name.to_string());
            Ok(())
        }
    }

    fn card() -> ShareCard {
        ShareCard {
            score: 12_345,
            level: 13,
            enemies_killed: 99,
            power_ups_collected: 4,
            shots_fired: 400,
            survived_secs: 125,
            new_high_score: true,
        }
    }

    #[test]
    fn test_share_text_contents() {
        let text = card().share_text();
        assert!(text.contains("12,345 points"));
        assert!(text.contains("Level: 13"));
        assert!(text.contains("Enemies: 99"));
    }

    #[test]
    fn test_formatting_helpers() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1_000), "1,000");
        assert_eq!(group_digits(1_234_567), "1,234,567");
        assert_eq!(format_duration(5), "0:05");
        assert_eq!(format_duration(125), "2:05");
    }

    #[test]
    fn test_native_share_wins() {
        let mut target = FakeTarget {
            native: true,
            clipboard: true,
            image: true,
            ..FakeTarget::default()
        };
        assert_eq!(block_on(share_with_fallback(&card(), &mut target)), ShareOutcome::Shared);
        assert!(target.downloads.is_empty() && target.copied.is_empty());
    }

    #[test]
    fn test_fallback_copies_and_downloads() {
        let mut target = FakeTarget {
            clipboard: true,
            image: true,
            ..FakeTarget::default()
        };
        let outcome = block_on(share_with_fallback(&card(), &mut target));
        assert_eq!(outcome, ShareOutcome::CopiedAndDownloaded);
        assert_eq!(target.downloads, vec![IMAGE_FILE_NAME.to_string()]);
        assert_eq!(target.copied.len(), 1);
    }

    #[test]
    fn test_download_only_when_clipboard_fails() {
        let mut target = FakeTarget {
            image: true,
            ..FakeTarget::default()
        };
        let outcome = block_on(share_with_fallback(&card(), &mut target));
        assert_eq!(outcome, ShareOutcome::Downloaded);
        assert!(outcome.notice().contains("manually"));
    }

    #[test]
    fn test_nothing_available_is_not_an_error() {
        let mut target = FakeTarget::default();
        assert_eq!(block_on(share_with_fallback(&card(), &mut target)), ShareOutcome::Manual);
    }

    #[test]
    fn test_card_renders_stats() {
        let mut surface = RecordingSurface::new(CARD_SIZE, CARD_SIZE);
        render_share_card(&card(), &mut surface);
        assert!(surface.has_text("12,345"));
        assert!(surface.has_text("Time Survived: 2:05"));
        assert!(surface.has_text("NEW HIGH SCORE!"));
    }
}
