// SPDX-License-Identifier: MPL-2.0
//! "Unsupported file" panel. The rest of the app stays usable.

use super::component::Message;
use crate::error::VideoError;
use crate::i18n::fluent::I18n;
use crate::ui::design_tokens::{palette, spacing, typography};
use crate::ui::styles;
use iced::widget::{button, Column, Container, Text};
use iced::{alignment, Element, Length};

pub fn view<'a>(i18n: &I18n, error: &VideoError, show_details: bool) -> Element<'a, Message> {
    let mut content = Column::new()
        .spacing(spacing::MD)
        .align_x(alignment::Horizontal::Center)
        .push(
            Text::new(i18n.tr("error-unsupported-title"))
                .size(typography::TITLE_SM)
                .color(palette::ERROR_500),
        )
        .push(Text::new(i18n.tr(error.i18n_key())).size(typography::BODY));

    if let Some(details) = error.details() {
        let label = if show_details {
            i18n.tr("error-details-hide")
        } else {
            i18n.tr("error-details-show")
        };
        content = content.push(
            button(Text::new(label).size(typography::CAPTION))
                .style(button::text)
                .on_press(Message::ToggleErrorDetails),
        );
        if show_details {
            content = content.push(
                Text::new(details.to_string())
                    .size(typography::CAPTION)
                    .color(palette::GRAY_400),
            );
        }
    }

    content = content.push(
        button(Text::new(i18n.tr("open-another-button")))
            .padding([spacing::XS, spacing::MD])
            .style(styles::button::primary)
            .on_press(Message::OpenFileRequested),
    );

    Container::new(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .align_x(alignment::Horizontal::Center)
        .align_y(alignment::Vertical::Center)
        .into()
}
