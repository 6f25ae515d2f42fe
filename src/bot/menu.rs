//! Main menu: welcome message, static info texts and the buttons that lead
//! to them.

use crate::channels::{InlineButton, InlineKeyboard};

/// Caption of the welcome photo (legacy Markdown).
pub const WELCOME_CAPTION: &str = "*Вас вітає офіційний телеграм-бот Патріотичної молоді України* — громадської організації, яка формує свідоме покоління українців!

Наша місія — розвиток національної ідентичності, підтримка активної громадянської позиції та єднання молоді навколо спільних цінностей.

*🌟 Хочеш змін? Почни з себе та стань частиною команди, яка творить майбутнє!*

*📥 Заповнюй форму — і доєднуйся до нас, щоб діяти разом!*";

pub const JOIN_TEXT: &str = "Поділіться вашим...";
pub const ABOUT_TEXT: &str =
    "Ми — Патріотична молодь України! Детальніше на сайті: https://pmu.org.ua";
pub const SUPPORT_TEXT: &str = "Звертайтесь на пошту: support@pmu.org.ua";
pub const UNKNOWN_OPTION: &str = "Unknown option.";

pub const JOIN_LABEL: &str = "🚀 Приєднатися";
pub const PUBLISHER_LABEL: &str = "🔐 Стати паблішером";
pub const ABOUT_LABEL: &str = "ℹ️ Про нас";
pub const SUPPORT_LABEL: &str = "❓ Підтримка";
pub const HOME_LABEL: &str = "🏠 Головне Меню";

/// Welcome photo file inside the assets directory.
pub const WELCOME_PHOTO: &str = "hello.png";
/// Photo sent with the submission confirmation.
pub const THANKS_PHOTO: &str = "thanks.png";

/// A main-menu choice, reachable from an inline button or from a reply
/// keyboard label typed as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Join,
    BecomePublisher,
    About,
    Support,
    Home,
}

impl MenuAction {
    /// Callback payload carried by the inline button.
    pub fn callback_data(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::BecomePublisher => "publisher",
            Self::About => "info",
            Self::Support => "support",
            Self::Home => "menu",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Join => JOIN_LABEL,
            Self::BecomePublisher => PUBLISHER_LABEL,
            Self::About => ABOUT_LABEL,
            Self::Support => SUPPORT_LABEL,
            Self::Home => HOME_LABEL,
        }
    }

    pub fn from_callback(data: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.callback_data() == data)
    }

    /// Match text typed (or sent by a reply keyboard) against menu labels.
    pub fn from_label(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.label() == text)
    }

    const ALL: [Self; 5] = [
        Self::Join,
        Self::BecomePublisher,
        Self::About,
        Self::Support,
        Self::Home,
    ];

    fn button(self) -> InlineButton {
        InlineButton::new(self.label(), self.callback_data())
    }
}

/// Keyboard under the welcome photo.
pub fn main_menu() -> InlineKeyboard {
    InlineKeyboard::new()
        .row([MenuAction::Join.button()])
        .row([MenuAction::BecomePublisher.button()])
        .row([MenuAction::About.button(), MenuAction::Support.button()])
}

/// Single "back to menu" button.
pub fn home_keyboard() -> InlineKeyboard {
    InlineKeyboard::new().row([MenuAction::Home.button()])
}
