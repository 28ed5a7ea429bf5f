/// Validation-layer debug callback (vulkan-validation feature only)

use ash::vk;
use colored::*;
use std::ffi::CStr;

/// Callback invoked by the VK_EXT_debug_utils messenger.
///
/// Prints validation messages with severity colors. Returning FALSE tells
/// the driver not to abort the triggering call.
pub(crate) unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    let callback_data = *p_callback_data;
    let message = if callback_data.p_message.is_null() {
        String::from("(no message)")
    } else {
        CStr::from_ptr(callback_data.p_message)
            .to_string_lossy()
            .into_owned()
    };

    let severity = match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => "VULKAN ERROR".red().bold(),
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => "VULKAN WARN ".yellow(),
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => "VULKAN INFO ".green(),
        _ => "VULKAN      ".bright_black(),
    };

    let kind = match message_type {
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "validation",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "performance",
        _ => "general",
    };

    eprintln!("[{}] [{}] {}", severity, kind, message);

    vk::FALSE
}
