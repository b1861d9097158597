//! Swapframe demo - flashes the window blue through the frame loop
//!
//! Opens a 1280x720 window, draws one frame per redraw until the window is
//! closed, then tears down and prints the validation report. Each error kind
//! maps to its own process exit code.

use std::process::ExitCode;

use swapframe_engine::swapframe::{self, ErrorKind, FrameLoop};
use swapframe_engine::swapframe::render::{Config, SwapchainDesc};
use swapframe_engine::{engine_error, engine_info};
use swapframe_engine_renderer_vulkan::swapframe::VulkanGraphicsDevice;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

const WINDOW_TITLE: &str = "swapframe";
const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 720;

/// Process exit code for a fatal engine error
fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DeviceInit => 2,
        ErrorKind::SwapchainCreation => 3,
        ErrorKind::SwapchainOutOfDate => 4,
        ErrorKind::AcquireTimeout => 5,
        ErrorKind::FrameTimeout => 6,
        ErrorKind::Present => 7,
        ErrorKind::Backend => 8,
        ErrorKind::InvalidState => 9,
        ErrorKind::OutOfMemory => 10,
    }
}

struct App {
    config: Config,
    // Dropped before the window so the surface goes first
    frame_loop: Option<FrameLoop<VulkanGraphicsDevice>>,
    window: Option<Window>,
    error: Option<swapframe::Error>,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            frame_loop: None,
            window: None,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> swapframe::Result<()> {
        let attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
            .with_resizable(false);
        let window = event_loop
            .create_window(attributes)
            .map_err(|e| swapframe::Error::DeviceInitError(format!("Failed to create window: {}", e)))?;

        let device = VulkanGraphicsDevice::new(&window, &self.config)?;
        engine_info!("swapframe::demo", "Running on {}", device.device_name());

        let size = window.inner_size();
        let desc = SwapchainDesc::new(size.width, size.height);
        let frame_loop = FrameLoop::new(device, &desc, &self.config)?;

        window.request_redraw();
        self.frame_loop = Some(frame_loop);
        self.window = Some(window);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: swapframe::Error) {
        engine_error!("swapframe::demo", "Fatal: {}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn teardown(&mut self) {
        if let Some(mut frame_loop) = self.frame_loop.take() {
            let stats = frame_loop.stats();
            if let Err(e) = frame_loop.shutdown() {
                engine_error!("swapframe::demo", "Shutdown failed: {}", e);
                if self.error.is_none() {
                    self.error = Some(e);
                }
            }
            engine_info!("swapframe::demo",
                "{} frames presented, {} suboptimal, average fence wait {:?}, longest {:?}",
                stats.frames_presented, stats.suboptimal_frames,
                stats.average_fence_wait(), stats.longest_fence_wait);
            frame_loop.device().print_validation_report();
        }
        self.window = None;
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                engine_info!("swapframe::demo", "Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let Some(frame_loop) = self.frame_loop.as_mut() else {
                    return;
                };
                match frame_loop.draw_frame() {
                    Ok(_) => {
                        if let Some(window) = self.window.as_ref() {
                            window.request_redraw();
                        }
                    }
                    Err(e) => self.fail(event_loop, e),
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}

fn main() -> ExitCode {
    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            engine_error!("swapframe::demo", "Failed to create event loop: {}", e);
            return ExitCode::FAILURE;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(Config::default());
    if let Err(e) = event_loop.run_app(&mut app) {
        engine_error!("swapframe::demo", "Event loop failed: {}", e);
        return ExitCode::FAILURE;
    }
    app.teardown();

    match app.error {
        Some(error) => ExitCode::from(exit_code(error.kind())),
        None => ExitCode::SUCCESS,
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
