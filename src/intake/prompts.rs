//! User-facing texts of the intake form.

/// Asked when the form starts.
pub const ASK_NAME: &str = "Як до вас звертатись? \nВведіть, будь ласка, ваше ім'я";

/// Re-prompt after a malformed email.
pub const INVALID_EMAIL: &str = "Неправильна адреса електронної пошти, спробуйте ще раз:";

/// Asked once the email is accepted.
pub const ASK_PASSWORD: &str = "Адресу електронної пошти додано! \nТепер придумайте пароль:";

/// Sent after `/cancel` drops an active form.
pub const CANCELLED: &str = "Заповнення форми скасовано. Щоб почати знову, натисніть «🔐 Стати паблішером».";

/// Greets the user by name and asks for the email.
pub fn ask_email(name: &str) -> String {
    format!("Раді знайомству, {name}! \nТепер додайте, будь ласка, адресу електронної пошти:")
}

/// Caption of the confirmation sent once the form is submitted for review.
pub fn submitted(name: &str) -> String {
    format!("Пароль додано! Дякуємо, {name}.\nВаш запит перебуває на розгляді.")
}
