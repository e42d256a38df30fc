//! Responder task: the UART owner on the actuator board.
//!
//! Reads one line at a time and hands it to the [`CommandDispatcher`].
//! LED commands drive the output; `PING` is answered with `PONG`;
//! anything else is reported and dropped.  The loop never exits on bad
//! input.

use crate::app::events::LinkEvent;
use crate::app::ports::{ClockPort, EventSink, OutputPort, WatchdogPort};
use crate::config::SystemConfig;
use crate::link::channel::LineChannel;
use crate::link::dispatcher::{CommandDispatcher, Dispatch};
use crate::link::transport::ByteChannel;
use crate::state::CancelToken;

const TASK: &str = "responder";

pub struct ResponderTask<T, O, C, W> {
    channel: LineChannel<T>,
    output: O,
    clock: C,
    watchdog: W,
    dispatcher: CommandDispatcher,
    read_timeout_ms: u32,
    poll_interval_ms: u32,
}

impl<T, O, C, W> ResponderTask<T, O, C, W>
where
    T: ByteChannel,
    O: OutputPort,
    C: ClockPort,
    W: WatchdogPort,
{
    pub fn new(
        channel: LineChannel<T>,
        output: O,
        clock: C,
        watchdog: W,
        config: &SystemConfig,
    ) -> Self {
        Self {
            channel,
            output,
            clock,
            watchdog,
            dispatcher: CommandDispatcher::new(config.tokens.clone()),
            read_timeout_ms: config.timing.read_timeout_ms,
            poll_interval_ms: config.timing.poll_interval_ms,
        }
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// Act on one received line.
    pub fn handle_line<S: EventSink>(&mut self, line: &str, sink: &mut S) {
        match self.dispatcher.dispatch(line, &mut self.output) {
            Dispatch::Output { level, changed } => {
                sink.emit(&LinkEvent::OutputApplied { level, changed });
            }
            Dispatch::Reply(reply) => match self.channel.write_line(reply) {
                Ok(()) => sink.emit(&LinkEvent::Replied {
                    request: line,
                    reply,
                }),
                Err(e) => sink.emit(&LinkEvent::TransportFailed(e)),
            },
            Dispatch::Ignored => sink.emit(&LinkEvent::StrayLine(line)),
            Dispatch::Unknown => sink.emit(&LinkEvent::UnknownCommand(line)),
        }
    }

    /// Read and handle at most one line.  Returns `true` if a line was
    /// handled.
    pub fn service_once<S: EventSink>(&mut self, sink: &mut S) -> bool {
        match self.channel.read_line(&self.clock, self.read_timeout_ms) {
            Ok(Some(line)) => {
                self.handle_line(&line, sink);
                true
            }
            Ok(None) => false,
            Err(e) => {
                sink.emit(&LinkEvent::TransportFailed(e));
                false
            }
        }
    }

    /// Run until `cancel` fires.
    pub fn run<S: EventSink>(&mut self, cancel: &CancelToken, sink: &mut S) {
        sink.emit(&LinkEvent::TaskStarted { task: TASK });

        while !cancel.is_cancelled() {
            self.watchdog.feed();
            // Drain back-to-back lines without sleeping in between.
            if !self.service_once(sink) {
                self.clock.sleep_ms(self.poll_interval_ms);
            }
        }

        sink.emit(&LinkEvent::TaskStopped { task: TASK });
    }
}
