use std::rc::Rc;

use gloo::events::EventListener;
use gloo::timers::callback::{Interval, Timeout};
use js_sys::{Date, Math};
use web_sys::{Element, MouseEvent, TouchEvent};
use yew::prelude::*;

use barentain_core::dodge::{
    ActivationOutcome, DodgeEngine, DodgePhase, DodgeReaction, DodgeTuning, Point, Size,
    SHRINK_SCALE,
};

const PHASE_TICK_MS: u32 = 200;
const OFF_PHASE_OPACITY: f64 = 0.4;
const MOVE_TRANSITION_MS: u32 = 300;

#[derive(Properties, PartialEq)]
pub(crate) struct DodgeButtonProps {
    pub on_activate: Callback<()>,
    pub label: AttrValue,
    #[prop_or_default]
    pub companion: NodeRef,
    #[prop_or_default]
    pub companion_label: AttrValue,
    #[prop_or_default]
    pub total_duration_ms: Option<f64>,
}

struct EngineCell {
    engine: DodgeEngine,
    started_at: Option<f64>,
    rotation_deg: f64,
}

impl EngineCell {
    fn elapsed(&self) -> f64 {
        match self.started_at {
            Some(started) => Date::now() - started,
            None => 0.0,
        }
    }
}

fn node_size(node: &NodeRef) -> Option<Size> {
    let element = node.cast::<Element>()?;
    let rect = element.get_bounding_client_rect();
    let size = Size::new(rect.width(), rect.height());
    (size.width > 0.0 && size.height > 0.0).then_some(size)
}

fn roll() -> f64 {
    Math::random()
}

#[function_component(DodgeButton)]
pub(crate) fn dodge_button(props: &DodgeButtonProps) -> Html {
    let tuning = DodgeTuning {
        total_duration_ms: props
            .total_duration_ms
            .unwrap_or(DodgeTuning::default().total_duration_ms),
        ..DodgeTuning::default()
    };
    let container_ref = use_node_ref();
    let button_ref = use_node_ref();
    let cell = use_mut_ref(|| EngineCell {
        engine: DodgeEngine::new(tuning),
        started_at: None,
        rotation_deg: 0.0,
    });
    let restore_timers = use_mut_ref(Vec::<Timeout>::new);

    let position = use_state_eq(|| None::<Point>);
    let reactive = use_state_eq(|| true);
    let settled = use_state_eq(|| false);
    let rotation = use_state_eq(|| 0.0f64);
    let shrunk = use_state_eq(|| false);
    let swap_offset = use_state_eq(|| None::<Point>);

    let apply_reaction: Rc<dyn Fn(DodgeReaction)> = {
        let cell = cell.clone();
        let restore_timers = restore_timers.clone();
        let position = position.clone();
        let rotation = rotation.clone();
        let shrunk = shrunk.clone();
        let swap_offset = swap_offset.clone();
        let container_ref = container_ref.clone();
        let companion = props.companion.clone();
        Rc::new(move |reaction: DodgeReaction| {
            let reaction = match reaction {
                DodgeReaction::Swap => {
                    let container = container_ref.cast::<Element>();
                    let companion = companion.cast::<Element>();
                    match (container, companion) {
                        (Some(container), Some(companion)) => {
                            let field = container.get_bounding_client_rect();
                            let target = companion.get_bounding_client_rect();
                            swap_offset.set(Some(Point::new(
                                target.left() - field.left(),
                                target.top() - field.top(),
                            )));
                            let swap_offset = swap_offset.clone();
                            let restore_ms = cell.borrow().engine.tuning().swap_restore_ms;
                            restore_timers.borrow_mut().push(Timeout::new(
                                restore_ms,
                                move || swap_offset.set(None),
                            ));
                            return;
                        }
                        // No measurable companion: degrade to a plain move.
                        _ => cell.borrow_mut().engine.force_relocate(&mut roll),
                    }
                }
                other => other,
            };
            let DodgeReaction::Dodge {
                to,
                spin_deg,
                shrink,
            } = reaction
            else {
                return;
            };
            position.set(Some(to));
            if spin_deg > 0.0 {
                let accumulated = {
                    let mut cell = cell.borrow_mut();
                    cell.rotation_deg += spin_deg;
                    cell.rotation_deg
                };
                rotation.set(accumulated);
            }
            if shrink {
                shrunk.set(true);
                let shrunk = shrunk.clone();
                let restore_ms = cell.borrow().engine.tuning().scale_restore_ms;
                restore_timers
                    .borrow_mut()
                    .push(Timeout::new(restore_ms, move || shrunk.set(false)));
            }
        })
    };

    // Phase clock: waits out missing geometry, then drives the ON/OFF cycle
    // and the terminal transition. Dropped with the component.
    {
        let cell = cell.clone();
        let container_ref = container_ref.clone();
        let button_ref = button_ref.clone();
        let position = position.clone();
        let reactive = reactive.clone();
        let settled = settled.clone();
        let rotation = rotation.clone();
        let shrunk = shrunk.clone();
        let swap_offset = swap_offset.clone();
        use_effect_with((), move |_| {
            let interval = Interval::new(PHASE_TICK_MS, move || {
                let phase = {
                    let mut cell = cell.borrow_mut();
                    if cell.engine.position().is_none() {
                        let container = node_size(&container_ref);
                        let button = node_size(&button_ref);
                        let (Some(container), Some(button)) = (container, button) else {
                            return;
                        };
                        if let Some(initial) = cell.engine.measure(container, button) {
                            cell.started_at = Some(Date::now());
                            position.set(Some(initial));
                        }
                    }
                    let elapsed = cell.elapsed();
                    cell.engine.advance(elapsed)
                };
                match phase {
                    DodgePhase::Settled => {
                        cell.borrow_mut().rotation_deg = 0.0;
                        settled.set(true);
                        reactive.set(true);
                        rotation.set(0.0);
                        shrunk.set(false);
                        swap_offset.set(None);
                    }
                    DodgePhase::Evasive { reactive: on } => {
                        reactive.set(on);
                    }
                }
            });
            move || drop(interval)
        });
    }

    // Keep the control inside the viewport when it changes size.
    {
        let cell = cell.clone();
        let container_ref = container_ref.clone();
        let button_ref = button_ref.clone();
        let position = position.clone();
        use_effect_with((), move |_| {
            let listener = web_sys::window().map(|window| {
                EventListener::new(&window, "resize", move |_| {
                    let container = node_size(&container_ref);
                    let button = node_size(&button_ref);
                    let (Some(container), Some(button)) = (container, button) else {
                        return;
                    };
                    if let Some(next) = cell.borrow_mut().engine.measure(container, button) {
                        position.set(Some(next));
                    }
                })
            });
            move || drop(listener)
        });
    }

    let on_mouse_move = {
        let cell = cell.clone();
        let container_ref = container_ref.clone();
        let apply_reaction = apply_reaction.clone();
        Callback::from(move |event: MouseEvent| {
            let Some(container) = container_ref.cast::<Element>() else {
                return;
            };
            let rect = container.get_bounding_client_rect();
            let pointer = Point::new(
                event.client_x() as f64 - rect.left(),
                event.client_y() as f64 - rect.top(),
            );
            let reaction = {
                let mut cell = cell.borrow_mut();
                if cell.started_at.is_none() {
                    return;
                }
                let elapsed = cell.elapsed();
                cell.engine.pointer_near(pointer, elapsed, &mut roll)
            };
            apply_reaction(reaction);
        })
    };

    let on_click = {
        let cell = cell.clone();
        let apply_reaction = apply_reaction.clone();
        let on_activate = props.on_activate.clone();
        Callback::from(move |event: MouseEvent| {
            let outcome = {
                let mut cell = cell.borrow_mut();
                let elapsed = cell.elapsed();
                cell.engine.activation(elapsed, &mut roll)
            };
            match outcome {
                ActivationOutcome::Invoke => on_activate.emit(()),
                ActivationOutcome::Suppressed(reaction) => {
                    event.prevent_default();
                    apply_reaction(reaction);
                }
                ActivationOutcome::Inert => {
                    event.prevent_default();
                }
            }
        })
    };

    // Touch attempts dodge like clicks; once settled the native click that
    // follows the touch does the invoking.
    let on_touch_start = {
        let cell = cell.clone();
        let apply_reaction = apply_reaction.clone();
        Callback::from(move |event: TouchEvent| {
            let outcome = {
                let mut cell = cell.borrow_mut();
                let elapsed = cell.elapsed();
                if cell.engine.is_settled() {
                    return;
                }
                cell.engine.activation(elapsed, &mut roll)
            };
            match outcome {
                ActivationOutcome::Invoke => {}
                ActivationOutcome::Suppressed(reaction) => {
                    event.prevent_default();
                    apply_reaction(reaction);
                }
                ActivationOutcome::Inert => {
                    event.prevent_default();
                }
            }
        })
    };

    let style = {
        let shown = (*swap_offset).or(*position);
        match shown {
            Some(point) => {
                let scale = if *shrunk { SHRINK_SCALE } else { 1.0 };
                let opacity = if *settled || *reactive {
                    1.0
                } else {
                    OFF_PHASE_OPACITY
                };
                format!(
                    "left:{:.1}px;top:{:.1}px;transform:rotate({}deg) scale({scale});\
                     opacity:{opacity};transition:all {MOVE_TRANSITION_MS}ms ease-out;",
                    point.x, point.y, *rotation
                )
            }
            None => String::new(),
        }
    };
    let swapped = swap_offset.is_some();
    let label = if swapped && !props.companion_label.is_empty() {
        props.companion_label.clone()
    } else {
        props.label.clone()
    };

    html! {
        <div ref={container_ref} class="dodge-field" onmousemove={on_mouse_move}>
            <button
                ref={button_ref}
                type="button"
                class="btn-secondary dodge-button"
                style={style}
                onclick={on_click}
                ontouchstart={on_touch_start}
                tabindex={if *settled { "0" } else { "-1" }}
                aria-hidden={(!*settled).then_some("true")}
            >
                { label }
            </button>
        </div>
    }
}
