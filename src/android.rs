//! JNI bindings for Android.
//!
//! These functions are called from Kotlin via the JNI bridge. Both return
//! JSON strings, or null on failure.

use jni::objects::{JClass, JString};
use jni::sys::{jfloat, jstring};
use jni::JNIEnv;

use crate::{pages_to_json, paginate_text, settings_and_theme, song_to_json, ParsedSong, Viewport};

fn optional_string(env: &mut JNIEnv, value: &JString) -> Option<String> {
    if value.is_null() {
        None
    } else {
        env.get_string(value).ok().map(|s| s.into())
    }
}

fn to_jstring(env: &mut JNIEnv, json: &str) -> jstring {
    match env.new_string(json) {
        Ok(js) => js.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Parse song text into the document + warnings JSON.
///
/// Called from Kotlin as:
///   external fun parseText(text: String): String?
#[no_mangle]
pub extern "system" fn Java_com_stagepro_app_StageLib_parseText(
    mut env: JNIEnv,
    _class: JClass,
    text: JString,
) -> jstring {
    let text: String = match env.get_string(&text) {
        Ok(s) => s.into(),
        Err(_) => return std::ptr::null_mut(),
    };

    match song_to_json(&ParsedSong::parse(&text)) {
        Ok(json) => to_jstring(&mut env, &json),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Parse and paginate song text for a viewport.
///
/// Called from Kotlin as:
///   external fun paginateText(text: String, width: Float, height: Float,
///                             settingsJson: String?, themeJson: String?): String?
#[no_mangle]
pub extern "system" fn Java_com_stagepro_app_StageLib_paginateText(
    mut env: JNIEnv,
    _class: JClass,
    text: JString,
    width: jfloat,
    height: jfloat,
    settings_json: JString,
    theme_json: JString,
) -> jstring {
    let text: String = match env.get_string(&text) {
        Ok(s) => s.into(),
        Err(_) => return std::ptr::null_mut(),
    };
    let settings_json = optional_string(&mut env, &settings_json);
    let theme_json = optional_string(&mut env, &theme_json);

    let (settings, theme) =
        match settings_and_theme(settings_json.as_deref(), theme_json.as_deref()) {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!("paginateText: {e}");
                return std::ptr::null_mut();
            }
        };

    let viewport = Viewport::new(width as f64, height as f64);
    match paginate_text(&text, viewport, &theme, &settings) {
        Ok(layout) => match pages_to_json(&layout) {
            Ok(json) => to_jstring(&mut env, &json),
            Err(_) => std::ptr::null_mut(),
        },
        Err(e) => {
            log::warn!("paginateText: {e}");
            std::ptr::null_mut()
        }
    }
}
