// SPDX-License-Identifier: MPL-2.0
//! Native window events routed to the application.

use super::Message;
use iced::{event, window, Subscription};

/// Close requests and file drops.
///
/// Everything else is handled by the widgets themselves.
pub fn create_event_subscription() -> Subscription<Message> {
    event::listen_with(|event, _status, window_id| match event {
        event::Event::Window(window::Event::CloseRequested) => {
            Some(Message::WindowCloseRequested(window_id))
        }
        event::Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
        _ => None,
    })
}
