// SPDX-License-Identifier: MPL-2.0
//! Dismissible notice for a file rejected while another video is shown.

use super::component::Message;
use crate::error::VideoError;
use crate::i18n::fluent::I18n;
use crate::ui::design_tokens::{palette, spacing, typography};
use crate::ui::styles;
use iced::widget::{button, container, Row, Text};
use iced::{alignment, Element, Length};

pub fn view<'a>(i18n: &I18n, error: &VideoError) -> Element<'a, Message> {
    let content = Row::new()
        .spacing(spacing::SM)
        .align_y(alignment::Vertical::Center)
        .push(
            Text::new(i18n.tr("error-unsupported-title"))
                .size(typography::BODY)
                .color(palette::WARNING_500),
        )
        .push(
            Text::new(i18n.tr(error.i18n_key()))
                .size(typography::CAPTION)
                .width(Length::Fill),
        )
        .push(
            button(Text::new(i18n.tr("notice-dismiss")).size(typography::CAPTION))
                .style(button::text)
                .on_press(Message::DismissNotice),
        );

    container(content)
        .padding([spacing::XS, spacing::MD])
        .width(Length::Fill)
        .style(styles::container::notice)
        .into()
}
