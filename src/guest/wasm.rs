//! WebAssembly guest backed by wasmtime
//!
//! The interpreter ships as a core wasm module. Its console imports are
//! linked to the [`IoBridge`] kept as the store's host data, so every guest
//! read, write and clock query lands on host state owned by this guest.

use std::path::Path;

use tracing::debug;
use wasmtime::{
    Caller, Engine, Extern, Instance, Linker, Memory, Module, Store, TypedFunc, WasmParams,
    WasmResults,
};

use crate::error::{GuestError, GuestResult};
use crate::guest::Guest;
use crate::io::IoBridge;
use crate::marshal;
use crate::scheduler::StepBudget;
use crate::status::StatusCode;
use crate::util::config::{ExportNames, ModuleConfig};

/// Interpreter module instantiated in its own wasmtime store.
pub struct WasmGuest {
    store: Store<IoBridge>,
    memory: Memory,
    exports: Exports,
}

struct Exports {
    names: ExportNames,
    initialize: TypedFunc<(), ()>,
    allocate: TypedFunc<u32, u32>,
    release: TypedFunc<(u32, u32), ()>,
    validate: TypedFunc<(u32, u32), i32>,
    init_run: TypedFunc<(u32, u32), i32>,
    deinit_run: TypedFunc<(), ()>,
    is_finished: TypedFunc<(), i32>,
    step: TypedFunc<u32, i32>,
}

impl std::fmt::Debug for WasmGuest {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("WasmGuest")
            .field("memory_bytes", &self.memory.data_size(&self.store))
            .field("bridge", self.store.data())
            .finish_non_exhaustive()
    }
}

impl WasmGuest {
    /// Compile and instantiate the module at `path` (binary or text format).
    pub fn load(
        path: &Path,
        config: &ModuleConfig,
        bridge: IoBridge,
    ) -> GuestResult<Self> {
        let engine = Engine::default();
        let module = Module::from_file(&engine, path)
            .map_err(|err| GuestError::Load(format!("{}: {:#}", path.display(), err)))?;
        debug!(path = %path.display(), "guest module compiled");
        Self::instantiate(&engine, &module, config, bridge)
    }

    /// Compile and instantiate a module held in memory.
    pub fn from_bytes(
        bytes: &[u8],
        config: &ModuleConfig,
        bridge: IoBridge,
    ) -> GuestResult<Self> {
        let engine = Engine::default();
        let module =
            Module::new(&engine, bytes).map_err(|err| GuestError::Load(format!("{:#}", err)))?;
        Self::instantiate(&engine, &module, config, bridge)
    }

    fn instantiate(
        engine: &Engine,
        module: &Module,
        config: &ModuleConfig,
        bridge: IoBridge,
    ) -> GuestResult<Self> {
        let mut linker = Linker::new(engine);
        link_console(&mut linker, config)?;

        let mut store = Store::new(engine, bridge);
        let instance = linker
            .instantiate(&mut store, module)
            .map_err(|err| GuestError::Load(format!("{:#}", err)))?;

        let names = config.exports.clone();
        let memory = instance
            .get_memory(&mut store, &names.memory)
            .ok_or_else(|| GuestError::MissingExport {
                name: names.memory.clone(),
            })?;

        let exports = Exports {
            initialize: typed(&instance, &mut store, &names.initialize)?,
            allocate: typed(&instance, &mut store, &names.allocate)?,
            release: typed(&instance, &mut store, &names.release)?,
            validate: typed(&instance, &mut store, &names.validate)?,
            init_run: typed(&instance, &mut store, &names.init_run)?,
            deinit_run: typed(&instance, &mut store, &names.deinit_run)?,
            is_finished: typed(&instance, &mut store, &names.is_finished)?,
            step: typed(&instance, &mut store, &names.step)?,
            names,
        };
        debug!("guest module instantiated");

        Ok(Self {
            store,
            memory,
            exports,
        })
    }

    fn trap(
        export: &str,
        err: wasmtime::Error,
    ) -> GuestError {
        GuestError::Trap {
            export: export.to_string(),
            message: format!("{:#}", err),
        }
    }
}

fn typed<P, R>(
    instance: &Instance,
    store: &mut Store<IoBridge>,
    name: &str,
) -> GuestResult<TypedFunc<P, R>>
where
    P: WasmParams,
    R: WasmResults,
{
    let func = instance
        .get_func(&mut *store, name)
        .ok_or_else(|| GuestError::MissingExport {
            name: name.to_string(),
        })?;
    func.typed::<P, R>(&*store).map_err(|err| {
        GuestError::Load(format!("export `{}` has an unexpected signature: {:#}", name, err))
    })
}

fn caller_memory(
    caller: &mut Caller<'_, IoBridge>,
    name: &str,
) -> wasmtime::Result<Memory> {
    caller
        .get_export(name)
        .and_then(Extern::into_memory)
        .ok_or_else(|| anyhow::anyhow!("guest does not export memory `{}`", name))
}

/// Register the console read/write and clock imports.
fn link_console(
    linker: &mut Linker<IoBridge>,
    config: &ModuleConfig,
) -> GuestResult<()> {
    let module = config.import_module.as_str();
    let imports = &config.imports;
    let link_err = |name: &str, err: wasmtime::Error| {
        GuestError::Load(format!("cannot link import `{}`: {:#}", name, err))
    };

    let memory_name = config.exports.memory.clone();
    linker
        .func_wrap(
            module,
            &imports.read,
            move |mut caller: Caller<'_, IoBridge>, ptr: u32, max_len: u32| -> wasmtime::Result<u32> {
                let memory = caller_memory(&mut caller, &memory_name)?;
                let (data, bridge) = memory.data_and_store_mut(&mut caller);
                let dest = marshal::region_mut(data, ptr, max_len)?;
                Ok(bridge.console_read(dest))
            },
        )
        .map_err(|err| link_err(imports.read.as_str(), err))?;

    let memory_name = config.exports.memory.clone();
    linker
        .func_wrap(
            module,
            &imports.write,
            move |mut caller: Caller<'_, IoBridge>, ptr: u32, len: u32| -> wasmtime::Result<()> {
                let memory = caller_memory(&mut caller, &memory_name)?;
                let bytes = marshal::copy_out(memory.data(&caller), ptr, len)?;
                caller.data_mut().console_write(&bytes)?;
                Ok(())
            },
        )
        .map_err(|err| link_err(imports.write.as_str(), err))?;

    linker
        .func_wrap(module, &imports.clock, |caller: Caller<'_, IoBridge>| -> u32 {
            caller.data().elapsed_millis()
        })
        .map_err(|err| link_err(imports.clock.as_str(), err))?;

    Ok(())
}

impl Guest for WasmGuest {
    fn initialize(&mut self) -> GuestResult<()> {
        self.exports
            .initialize
            .call(&mut self.store, ())
            .map_err(|err| Self::trap(&self.exports.names.initialize, err))
    }

    fn allocate(
        &mut self,
        size: u32,
    ) -> GuestResult<u32> {
        self.exports
            .allocate
            .call(&mut self.store, size)
            .map_err(|err| Self::trap(&self.exports.names.allocate, err))
    }

    fn release(
        &mut self,
        ptr: u32,
        size: u32,
    ) -> GuestResult<()> {
        self.exports
            .release
            .call(&mut self.store, (ptr, size))
            .map_err(|err| Self::trap(&self.exports.names.release, err))
    }

    fn validate_source(
        &mut self,
        ptr: u32,
        len: u32,
    ) -> GuestResult<StatusCode> {
        self.exports
            .validate
            .call(&mut self.store, (ptr, len))
            .map(StatusCode)
            .map_err(|err| Self::trap(&self.exports.names.validate, err))
    }

    fn init_run(
        &mut self,
        ptr: u32,
        len: u32,
    ) -> GuestResult<StatusCode> {
        self.exports
            .init_run
            .call(&mut self.store, (ptr, len))
            .map(StatusCode)
            .map_err(|err| Self::trap(&self.exports.names.init_run, err))
    }

    fn deinit_run(&mut self) -> GuestResult<()> {
        self.exports
            .deinit_run
            .call(&mut self.store, ())
            .map_err(|err| Self::trap(&self.exports.names.deinit_run, err))
    }

    fn is_run_finished(&mut self) -> GuestResult<bool> {
        self.exports
            .is_finished
            .call(&mut self.store, ())
            .map(|done| done != 0)
            .map_err(|err| Self::trap(&self.exports.names.is_finished, err))
    }

    fn step_run(
        &mut self,
        budget: StepBudget,
    ) -> GuestResult<StatusCode> {
        self.exports
            .step
            .call(&mut self.store, budget.get())
            .map(StatusCode)
            .map_err(|err| Self::trap(&self.exports.names.step, err))
    }

    fn memory(&self) -> &[u8] {
        self.memory.data(&self.store)
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        self.memory.data_mut(&mut self.store)
    }

    fn bridge(&self) -> &IoBridge {
        self.store.data()
    }

    fn bridge_mut(&mut self) -> &mut IoBridge {
        self.store.data_mut()
    }
}
