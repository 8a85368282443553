//! Builds the status embed that gets published to the channel.

use chrono::DateTime;
use chrono_tz::Tz;
use serenity::all::{CreateEmbed, CreateEmbedFooter};

use crate::schedule::{BASE_FLAG, REGIONS, TimeWindow};
use crate::status::DisplayStatus;

const TITLE: &str = "🚨 Estado del Stream de Cholito_o:";

const ONLINE_COLOR: u32 = 0x2ecc71;
const OFFLINE_COLOR: u32 = 0x9146FF;

const THUMBNAIL_URL: &str =
    "https://static-cdn.jtvnw.net/jtv_user_pictures/cholito_o-profile_image-70a1a8e045a2c260-70x70.png";

const PROMO_TEXT: &str = "⚠️ Recuerda que en Instagram siempre se avisa antes que en cualquier otro lugar sobre cambios o streams especiales.\n\n👉 Síguelo para no perderte nada: https://www.instagram.com/cholit0_o/";

pub fn accent_color(online: bool) -> u32 {
    if online { ONLINE_COLOR } else { OFFLINE_COLOR }
}

pub fn current_status_line(online: bool) -> &'static str {
    if online { "🟢 **ON**" } else { "🔴 **OFF**" }
}

pub fn detailed_status_line(status: DisplayStatus) -> &'static str {
    match status {
        DisplayStatus::NoStreamToday => "❌ Hoy no hay stream",
        DisplayStatus::ScheduledLater => "⏳ Hoy hay stream",
        DisplayStatus::LiveNow => "✅ Stream activo ahora mismo",
    }
}

/// One line per region: the base window first, then every derived region in
/// table order.
pub fn schedule_lines(window: TimeWindow) -> Vec<String> {
    let mut lines = Vec::with_capacity(1 + REGIONS.len());
    lines.push(format!("{BASE_FLAG} {window}"));
    for region in &REGIONS {
        lines.push(format!(
            "{} {}",
            region.flag,
            window.adjusted(region.offset_hours)
        ));
    }
    lines
}

pub fn status_embed(
    status: DisplayStatus,
    online: bool,
    window: TimeWindow,
    updated_at: DateTime<Tz>,
) -> CreateEmbed {
    CreateEmbed::new()
        .title(TITLE)
        .color(accent_color(online))
        .field("Estado actual :", current_status_line(online), false)
        .field("Estado detallado :", detailed_status_line(status), false)
        .field("Horario del stream:", schedule_lines(window).join("\n"), false)
        // Discord rejects empty field names; a zero-width space keeps the
        // promo block visually unlabeled
        .field("\u{200B}", PROMO_TEXT, false)
        .footer(CreateEmbedFooter::new(format!(
            "Última actualización: {} (UY)",
            updated_at.format("%d-%m-%Y %H:%M")
        )))
        .thumbnail(THUMBNAIL_URL)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use chrono_tz::America::Montevideo;

    use super::*;
    use crate::status::{StreamState, evaluate};

    fn default_window() -> TimeWindow {
        StreamState::default().window
    }

    #[test]
    fn schedule_lines_start_with_base_region() {
        let lines = schedule_lines(default_window());
        assert_eq!(lines[0], "🇺🇾 18:00 - 22:00");
    }

    #[test]
    fn schedule_lines_cover_every_region_in_order() {
        let lines = schedule_lines(default_window());
        assert_eq!(
            lines,
            [
                "🇺🇾 18:00 - 22:00",
                "🇨🇱 17:00 - 21:00",
                "🇨🇴 16:00 - 20:00",
                "🇪🇸 23:00 - 03:00",
                "🇲🇽 15:00 - 19:00",
                "🇵🇪 16:00 - 20:00",
            ]
        );
    }

    #[test]
    fn accent_color_tracks_online_flag() {
        assert_eq!(accent_color(true), 0x2ecc71);
        assert_eq!(accent_color(false), 0x9146FF);
    }

    #[test]
    fn indicator_and_detail_may_disagree_on_weekends() {
        // live on a Saturday: the indicator says ON while the detailed
        // field says there is no stream today
        let online = true;
        let status = evaluate(online, false, chrono::Weekday::Sat);
        assert_eq!(current_status_line(online), "🟢 **ON**");
        assert_eq!(detailed_status_line(status), "❌ Hoy no hay stream");
    }

    #[test]
    fn embed_carries_title_fields_footer_and_thumbnail() {
        let updated_at = Montevideo.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap();
        let embed = status_embed(DisplayStatus::ScheduledLater, false, default_window(), updated_at);

        let value = serde_json::to_value(&embed).unwrap();
        assert_eq!(value["title"], "🚨 Estado del Stream de Cholito_o:");
        assert_eq!(value["color"], 0x9146FF);
        assert_eq!(
            value["footer"]["text"],
            "Última actualización: 05-03-2024 14:07 (UY)"
        );
        assert_eq!(value["thumbnail"]["url"], THUMBNAIL_URL);

        let fields = value["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0]["name"], "Estado actual :");
        assert_eq!(fields[0]["value"], "🔴 **OFF**");
        assert_eq!(fields[1]["name"], "Estado detallado :");
        assert_eq!(fields[1]["value"], "⏳ Hoy hay stream");
        assert_eq!(fields[2]["name"], "Horario del stream:");
        assert_eq!(
            fields[2]["value"],
            "🇺🇾 18:00 - 22:00\n🇨🇱 17:00 - 21:00\n🇨🇴 16:00 - 20:00\n🇪🇸 23:00 - 03:00\n🇲🇽 15:00 - 19:00\n🇵🇪 16:00 - 20:00"
        );
        assert!(fields[3]["value"].as_str().unwrap().contains("Instagram"));
    }
}
