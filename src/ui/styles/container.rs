// SPDX-License-Identifier: MPL-2.0
//! Container styles.

use crate::ui::design_tokens::{opacity, palette, radius};
use iced::widget::container;
use iced::{Background, Border, Color, Theme};

/// Panel surface derived from the theme background, used for the metadata panel.
pub fn panel(theme: &Theme) -> container::Style {
    let base = theme.extended_palette().background.base.color;

    container::Style {
        background: Some(Background::Color(Color {
            a: opacity::SURFACE,
            ..base
        })),
        border: Border {
            radius: radius::MD.into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Short-lived notice shown above a loaded preview.
pub fn notice(theme: &Theme) -> container::Style {
    container::Style {
        border: Border {
            color: palette::WARNING_500,
            width: 1.0,
            radius: radius::SM.into(),
        },
        ..panel(theme)
    }
}

/// Letterbox behind the render surface.
pub fn surface_frame(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(palette::BLACK)),
        border: Border {
            radius: radius::SM.into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Small label shown on hover over the playback control.
pub fn tooltip(theme: &Theme) -> container::Style {
    let bg = theme.extended_palette().background.base.color;
    let is_dark = (bg.r + bg.g + bg.b) / 3.0 < 0.5;
    let (background, text) = if is_dark {
        (palette::GRAY_100, palette::GRAY_900)
    } else {
        (palette::GRAY_900, palette::GRAY_100)
    };

    container::Style {
        background: Some(Background::Color(background)),
        text_color: Some(text),
        border: Border {
            radius: radius::SM.into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tooltip_contrasts_with_theme() {
        let dark = tooltip(&Theme::Dark);
        let light = tooltip(&Theme::Light);
        assert_eq!(dark.background, Some(Background::Color(palette::GRAY_100)));
        assert_eq!(light.background, Some(Background::Color(palette::GRAY_900)));
    }
}
