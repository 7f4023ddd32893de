// SPDX-License-Identifier: MPL-2.0
//! Side panel with the "Metadata" header and the formatted duration.

use super::component::Message;
use crate::i18n::fluent::I18n;
use crate::ui::design_tokens::{palette, sizing, spacing, typography};
use crate::ui::styles;
use iced::widget::{rule, Column, Container, Text};
use iced::{Element, Length};

/// What the panel shows. Built from the preview state on every view.
#[derive(Debug, Clone, PartialEq)]
pub struct Info {
    pub file_name: String,
    /// `None` until metadata arrived.
    pub duration: Option<String>,
    pub has_audio: bool,
}

pub fn view<'a>(i18n: &I18n, info: Info) -> Element<'a, Message> {
    let mut content = Column::new()
        .spacing(spacing::XS)
        .push(Text::new(i18n.tr("metadata-title")).size(typography::TITLE_SM))
        .push(rule::horizontal(1))
        .push(
            Text::new(i18n.tr_with_args("metadata-file", &[("file", &info.file_name)]))
                .size(typography::CAPTION)
                .color(palette::GRAY_400),
        );

    match info.duration {
        Some(duration) => {
            content = content
                .push(
                    Text::new(i18n.tr_with_args("metadata-duration", &[("duration", &duration)]))
                        .size(typography::BODY),
                )
                .push(
                    Text::new(if info.has_audio {
                        i18n.tr("metadata-audio-present")
                    } else {
                        i18n.tr("metadata-audio-absent")
                    })
                    .size(typography::BODY),
                );
        }
        None => {
            content = content.push(Text::new(i18n.tr("metadata-loading")).size(typography::BODY));
        }
    }

    Container::new(content)
        .width(Length::Fixed(sizing::METADATA_PANEL_WIDTH))
        .padding(spacing::MD)
        .style(styles::container::panel)
        .into()
}
