use std::path::PathBuf;

use rfd::{AsyncFileDialog, AsyncMessageDialog, MessageButtons, MessageLevel};

pub async fn pick_image() -> Option<PathBuf> {
    AsyncFileDialog::new()
        .set_title("Select Image")
        .add_filter("Image Files", &["png", "jpg", "jpeg"])
        .pick_file()
        .await
        .map(|file| file.path().to_path_buf())
}

pub async fn alert(level: MessageLevel, title: String, description: String) {
    AsyncMessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show()
        .await;
}
