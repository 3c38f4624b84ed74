/// Reusable UI components

use yew::prelude::*;
use patternfly_yew::prelude::*;

#[derive(PartialEq, Clone, Copy, Default)]
pub enum StatusKind {
    Success,
    #[default]
    Error,
}

impl StatusKind {
    fn title(self) -> &'static str {
        match self {
            StatusKind::Success => "Success",
            StatusKind::Error => "Error",
        }
    }

    fn alert_type(self) -> AlertType {
        match self {
            StatusKind::Success => AlertType::Success,
            StatusKind::Error => AlertType::Danger,
        }
    }
}

#[derive(Properties, PartialEq)]
pub struct StatusModalProps {
    pub message: String,
    #[prop_or_default]
    pub kind: StatusKind,
    /// Fired when the user dismisses the message
    pub on_close: Callback<()>,
}

/// Status message with a dismiss button
#[function_component(StatusModal)]
pub fn status_modal(props: &StatusModalProps) -> Html {
    html! {
        <div class="message-top-margin">
            <Alert r#type={props.kind.alert_type()} title={props.kind.title()} inline={true}>
                <p class="message-paragraph">{&props.message}</p>
                <Button
                    onclick={props.on_close.reform(|_| ())}
                    variant={ButtonVariant::Secondary}
                    size={ButtonSize::Small}
                >
                    {"Got it!"}
                </Button>
            </Alert>
        </div>
    }
}
