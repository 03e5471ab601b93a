//! The three fixed-text messages sent over the trial subscription lifecycle.

pub fn registration_confirmation(
    kecamatan: &str,
    kabupaten: &str,
    severity_threshold: &str,
    duration_hours: i64,
) -> String {
    let location_label = if kabupaten.is_empty() {
        kecamatan.to_string()
    } else {
        format!("{kecamatan}, {kabupaten}")
    };

    format!(
        "<b>Trial BMKG Alert Aktif!</b>\n\n\
         Lokasi: {location_label}\n\
         Severity: {severity_threshold}\n\
         Berlaku: {duration_hours} jam\n\n\
         Anda akan menerima notifikasi peringatan cuaca BMKG untuk lokasi ini selama masa trial.\n\n\
         <i>BMKG Alert System</i>"
    )
}

pub fn expiry() -> String {
    "<b>Trial BMKG Alert Berakhir</b>\n\nTrial Anda telah berakhir. Terima kasih sudah mencoba BMKG Alert!\n\n<i>BMKG Alert System</i>".to_string()
}

pub fn cancellation() -> String {
    "<b>Trial BMKG Alert Dihentikan</b>\n\nTrial Anda telah dihentikan. Terima kasih sudah mencoba BMKG Alert!\n\n<i>BMKG Alert System</i>".to_string()
}
