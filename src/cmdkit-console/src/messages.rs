//! Default console replies for every core message key.

use cmdkit_core::{CommandManager, MessageContext, MessageKey};

use crate::sender::ConsoleSender;

/// Register the default text for every key the core emits.
pub fn install_defaults<S>(manager: &CommandManager<S>)
where
    S: ConsoleSender + Send + 'static,
{
    reply(manager, MessageKey::UNKNOWN_COMMAND, |context| {
        format!("Unknown command: `{}`.", context.command)
    });
    reply(manager, MessageKey::UNKNOWN_SUB_COMMAND, |context| {
        format!("Unknown command: `{} {}`.", context.command, typed(context))
    });
    reply(manager, MessageKey::TOO_MANY_ARGUMENTS, |_| "Invalid usage.".to_string());
    reply(manager, MessageKey::NOT_ENOUGH_ARGUMENTS, |_| "Invalid usage.".to_string());
    reply(manager, MessageKey::INVALID_ARGUMENT, |context| {
        format!(
            "Invalid argument `{}` for type `{}`.",
            typed(context),
            type_name(context)
        )
    });
    reply(manager, MessageKey::MISSING_REQUIRED_FLAG, |_| {
        "Command is missing required flags.".to_string()
    });
    reply(manager, MessageKey::MISSING_REQUIRED_FLAG_ARGUMENT, |_| {
        "Command is missing required flags argument.".to_string()
    });
    reply(manager, MessageKey::INVALID_FLAG_ARGUMENT, |context| {
        format!(
            "Invalid flag argument `{}` for type `{}`.",
            typed(context),
            type_name(context)
        )
    });
    reply(manager, MessageKey::NO_PERMISSION, |context| {
        format!(
            "You do not have permission to perform this command. Permission needed: `{}`.",
            context.permission.as_deref().unwrap_or_default()
        )
    });
    reply(manager, MessageKey::EXECUTION_FAILED, |_| {
        "An internal error occurred while attempting to perform this command.".to_string()
    });
}

fn reply<S, F>(manager: &CommandManager<S>, key: MessageKey, text: F)
where
    S: ConsoleSender + Send + 'static,
    F: Fn(&MessageContext) -> String + Send + Sync + 'static,
{
    manager.register_message(key, move |sender: &S, context: &MessageContext| {
        sender.send_message(&text(context))
    });
}

fn typed(context: &MessageContext) -> &str {
    context.typed_argument.as_deref().unwrap_or_default()
}

fn type_name(context: &MessageContext) -> &'static str {
    context
        .argument_type
        .map(|argument_type| argument_type.simple_name())
        .unwrap_or_default()
}
