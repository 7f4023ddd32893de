// SPDX-License-Identifier: MPL-2.0
//! Play/pause control drawn over the render surface.

use super::component::Message;
use crate::i18n::fluent::I18n;
use crate::ui::design_tokens::{sizing, spacing};
use crate::ui::styles;
use crate::video_player::Phase;
use iced::widget::canvas::{self, Canvas, Frame, Geometry, Path};
use iced::widget::{button, container, text, tooltip};
use iced::{mouse, Color, Element, Length, Point, Rectangle, Renderer, Size, Theme};

/// Play triangle or pause bars, drawn in the button's text color.
#[derive(Debug, Clone, Copy)]
struct Glyph {
    phase: Phase,
    color: Color,
}

impl canvas::Program<Message> for Glyph {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let w = bounds.width;
        let h = bounds.height;

        match self.phase {
            Phase::Paused => {
                let triangle = Path::new(|p| {
                    p.move_to(Point::new(w * 0.2, 0.0));
                    p.line_to(Point::new(w * 0.95, h * 0.5));
                    p.line_to(Point::new(w * 0.2, h));
                    p.close();
                });
                frame.fill(&triangle, self.color);
            }
            Phase::Playing => {
                let bar = Size::new(w * 0.28, h);
                frame.fill_rectangle(Point::new(w * 0.1, 0.0), bar, self.color);
                frame.fill_rectangle(Point::new(w * 0.62, 0.0), bar, self.color);
            }
        }

        vec![frame.into_geometry()]
    }
}

/// Renders the control. Without `enabled` the button has no press handler
/// and its tooltip explains why.
pub fn view<'a>(i18n: &I18n, phase: Phase, enabled: bool) -> Element<'a, Message> {
    let glyph_color = if enabled {
        Color::WHITE
    } else {
        Color {
            a: 0.4,
            ..Color::WHITE
        }
    };
    let glyph = Canvas::new(Glyph {
        phase,
        color: glyph_color,
    })
    .width(Length::Fixed(sizing::ICON_SM))
    .height(Length::Fixed(sizing::ICON_SM));

    let control = button(
        container(glyph)
            .center_x(Length::Fill)
            .center_y(Length::Fill),
    )
    .width(Length::Fixed(sizing::CONTROL_BUTTON))
    .height(Length::Fixed(sizing::CONTROL_BUTTON))
    .style(styles::button::playback_control)
    .on_press_maybe(enabled.then_some(Message::TogglePlayback));

    let tip = if !enabled {
        i18n.tr("control-no-audio")
    } else if phase == Phase::Playing {
        i18n.tr("control-pause")
    } else {
        i18n.tr("control-play")
    };

    tooltip(
        control,
        container(text(tip)).padding(spacing::XS),
        tooltip::Position::Top,
    )
    .style(styles::container::tooltip)
    .into()
}
