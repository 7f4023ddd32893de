// SPDX-License-Identifier: MPL-2.0
//! Button styles.

use crate::ui::design_tokens::{
    opacity,
    palette::{self, BLACK, WHITE},
    radius, shadow,
};
use iced::widget::button;
use iced::{Background, Border, Color, Theme};

/// Main call to action, e.g. "Open video".
pub fn primary(_theme: &Theme, status: button::Status) -> button::Style {
    let (background, border_color, elevation) = match status {
        button::Status::Hovered => (palette::PRIMARY_400, palette::PRIMARY_500, shadow::MD),
        button::Status::Disabled => (palette::GRAY_200, palette::GRAY_400, shadow::NONE),
        button::Status::Active | button::Status::Pressed => {
            (palette::PRIMARY_500, palette::PRIMARY_600, shadow::SM)
        }
    };

    button::Style {
        background: Some(Background::Color(background)),
        text_color: if status == button::Status::Disabled {
            palette::GRAY_400
        } else {
            WHITE
        },
        border: Border {
            color: border_color,
            width: 1.0,
            radius: radius::SM.into(),
        },
        shadow: elevation,
        snap: true,
    }
}

/// Round play/pause control drawn over the surface.
///
/// The disabled look stays visible so users see that the control exists
/// but cannot be used for the current video.
pub fn playback_control(_theme: &Theme, status: button::Status) -> button::Style {
    let (alpha, text_color) = match status {
        button::Status::Hovered => (opacity::OVERLAY_HOVER, WHITE),
        button::Status::Pressed => (opacity::OVERLAY_PRESSED, WHITE),
        button::Status::Active => (opacity::OVERLAY_MEDIUM, WHITE),
        button::Status::Disabled => (opacity::OVERLAY_SUBTLE, palette::GRAY_400),
    };

    button::Style {
        background: Some(Background::Color(Color { a: alpha, ..BLACK })),
        text_color,
        border: Border {
            radius: radius::FULL.into(),
            ..Default::default()
        },
        shadow: if status == button::Status::Disabled {
            shadow::NONE
        } else {
            shadow::MD
        },
        snap: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_button_uses_brand_colors() {
        let style = primary(&Theme::Dark, button::Status::Active);
        assert_eq!(
            style.background,
            Some(Background::Color(palette::PRIMARY_500))
        );
    }

    #[test]
    fn playback_control_dims_when_disabled() {
        let active = playback_control(&Theme::Dark, button::Status::Active);
        let disabled = playback_control(&Theme::Dark, button::Status::Disabled);

        assert_ne!(active.background, disabled.background);
        assert_eq!(disabled.text_color, palette::GRAY_400);
        assert_eq!(disabled.shadow, shadow::NONE);
    }
}
