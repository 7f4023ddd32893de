// SPDX-License-Identifier: MPL-2.0
//! Waveform strip: min/max envelope, RMS body and playhead.

use super::component::Message;
use crate::i18n::fluent::I18n;
use crate::ui::design_tokens::{palette, sizing, typography};
use crate::ui::theming::ColorScheme;
use crate::video_player::waveform::PeakBin;
use crate::video_player::WaveformSnapshot;
use iced::widget::canvas::{self, Canvas, Frame, Geometry, Path, Stroke};
use iced::widget::{container, Text};
use iced::{mouse, Element, Length, Point, Rectangle, Renderer, Size, Theme};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Envelope {
    bins: Arc<Vec<PeakBin>>,
    progress: f32,
    colors: ColorScheme,
}

impl canvas::Program<Message> for Envelope {
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
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), self.colors.surface_secondary);

        let width = bounds.width;
        let center_y = bounds.height / 2.0;
        let scale = center_y * 0.9;

        if !self.bins.is_empty() && width >= 1.0 {
            let bin_width = width / self.bins.len() as f32;
            for (i, bin) in self.bins.iter().enumerate() {
                let x = i as f32 * bin_width;
                let top = center_y - bin.max.clamp(-1.0, 1.0) * scale;
                let bottom = center_y - bin.min.clamp(-1.0, 1.0) * scale;
                frame.fill_rectangle(
                    Point::new(x, top),
                    Size::new(bin_width.max(1.0), (bottom - top).max(1.0)),
                    self.colors.waveform_peak,
                );

                let rms = bin.rms.clamp(0.0, 1.0) * scale;
                frame.fill_rectangle(
                    Point::new(x, center_y - rms),
                    Size::new(bin_width.max(1.0), (rms * 2.0).max(1.0)),
                    self.colors.waveform_rms,
                );
            }
        }

        let playhead_x = self.progress.clamp(0.0, 1.0) * width;
        frame.stroke(
            &Path::line(
                Point::new(playhead_x, 0.0),
                Point::new(playhead_x, bounds.height),
            ),
            Stroke::default()
                .with_color(self.colors.playhead)
                .with_width(2.0),
        );

        vec![frame.into_geometry()]
    }
}

/// Renders the add-on's current snapshot.
pub fn view<'a>(
    i18n: &I18n,
    snapshot: WaveformSnapshot<'_>,
    colors: &ColorScheme,
) -> Option<Element<'a, Message>> {
    let label = match snapshot {
        WaveformSnapshot::Detached => return None,
        WaveformSnapshot::Ready { peaks, progress } => {
            return Some(
                Canvas::new(Envelope {
                    bins: Arc::clone(&peaks.bins),
                    progress,
                    colors: colors.clone(),
                })
                .width(Length::Fill)
                .height(Length::Fixed(sizing::WAVEFORM_HEIGHT))
                .into(),
            );
        }
        WaveformSnapshot::NoAudio => i18n.tr("waveform-no-audio"),
        WaveformSnapshot::Loading => i18n.tr("waveform-loading"),
        WaveformSnapshot::Failed => i18n.tr("waveform-failed"),
    };

    Some(
        container(
            Text::new(label)
                .size(typography::CAPTION)
                .color(palette::GRAY_400),
        )
        .width(Length::Fill)
        .center_y(Length::Fixed(sizing::WAVEFORM_HEIGHT))
        .into(),
    )
}
