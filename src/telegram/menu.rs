//! Reply texts and the quality keyboard

use indoc::formatdoc;
use teloxide::types::UserId;

use crate::core::utils::escape_html;
use crate::download::quality::{resolve, QualityTier};
use crate::telegram::transport::InlineButton;

/// Rejection sent for text that is not a downloadable link
pub const INVALID_URL_TEXT: &str =
    "❌ Please send a valid URL starting with http:// or https://\n\nUse /help for more information.";

/// HTML mention of a user, `<a href="tg://user?id=…">name</a>`
pub fn user_mention(user_id: UserId, name: &str) -> String {
    format!("<a href=\"tg://user?id={}\">{}</a>", user_id.0, escape_html(name))
}

pub fn welcome_text(mention: &str) -> String {
    formatdoc! {"
        👋 Welcome {mention}!

        🤖 I download videos from links you send me.

        📋 Available Commands:
        /start - Start the bot
        /help - Get help
        /quality - Choose download quality

        Send me a link to download!",
        mention = mention
    }
}

pub fn help_text(tier: QualityTier) -> String {
    formatdoc! {"
        🆘 <b>How to use this bot:</b>

        1️⃣ Use /quality to select your preferred quality
        2️⃣ Send me any media link
        3️⃣ I'll download it and send it to you

        💡 <b>Supported sources:</b>
        • YouTube, Vimeo and most video sites
        • Direct links to media files

        ⚙️ Current quality: <b>{tier}</b>",
        tier = tier.display_name()
    }
}

pub fn quality_menu_text(tier: QualityTier) -> String {
    format!("🎚️ <b>Select Quality</b>\n\nCurrent: <b>{}</b>", tier.display_name())
}

fn button_label(tier: QualityTier) -> String {
    let icon = match tier {
        QualityTier::Low => "📉",
        QualityTier::Medium => "📊",
        QualityTier::High => "📈",
        QualityTier::Ultra => "🎯",
    };
    let name = tier.as_ref();
    let mut chars = name.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    format!("{} {} ({})", icon, capitalized, resolve(tier).label)
}

/// Two rows of two buttons, lowest tier first
pub fn quality_keyboard() -> Vec<Vec<InlineButton>> {
    let buttons: Vec<InlineButton> = QualityTier::all()
        .map(|tier| InlineButton::new(button_label(tier), tier.callback_payload()))
        .collect();
    buttons.chunks(2).map(<[InlineButton]>::to_vec).collect()
}

pub fn quality_confirmation_text(tier: QualityTier) -> String {
    let spec = resolve(tier);
    formatdoc! {"
        ✅ Quality set to: <b>{tier}</b>

        📹 Video: {video}
        🎵 Audio: {audio}

        Now send me a link to download!",
        tier = tier.display_name(),
        video = spec.label,
        audio = spec.audio_bitrate
    }
}

pub fn processing_text(tier: QualityTier, url: &str) -> String {
    formatdoc! {"
        🔄 Processing your link...

        Quality: <b>{tier}</b>
        Link: <code>{url}</code>

        ⏳ Please wait...",
        tier = tier.display_name(),
        url = escape_html(url)
    }
}
