//! libindicator / GTK 2 bridge, resolved at runtime with `libloading`.
//!
//! Only the handful of symbols the applet needs are looked up.  Everything
//! crossing the boundary is copied into owned Rust values right away; no GTK
//! pointer escapes this module.

use super::{EntryImage, EntryKey, IndicatorBridge, IndicatorEntry, ID};
use libloading::Library;
use panel_config::IndicatorConfig;
use panel_core::{PanelError, Pixmap, Result};
use std::ffi::{c_char, c_int, c_uint, c_void, CStr, CString};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use tracing::{debug, warn};

/// `GtkImageType` values we can show.
const GTK_IMAGE_PIXBUF: c_int = 3;
const GTK_IMAGE_ICON_NAME: c_int = 7;

/// Upper bound on native events handled per pump, so a busy indicator can't
/// stall the panel.
const MAX_EVENTS_PER_PUMP: usize = 64;

#[repr(C)]
struct GList {
    data: *mut c_void,
    next: *mut GList,
    #[allow(dead_code)]
    prev: *mut GList,
}

/// Leading fields of `IndicatorObjectEntry`.
#[repr(C)]
struct RawEntry {
    label: *mut c_void,
    image: *mut c_void,
    menu:  *mut c_void,
}

type MenuPositionFn = Option<unsafe extern "C" fn(*mut c_void, *mut c_int, *mut c_int, *mut c_int, *mut c_void)>;

/// Function pointers copied out of the loaded libraries.
struct Api {
    gtk_init_check:                 unsafe extern "C" fn(*mut c_int, *mut *mut *mut c_char) -> c_int,
    indicator_object_new_from_file: unsafe extern "C" fn(*const c_char) -> *mut c_void,
    indicator_object_get_entries:   unsafe extern "C" fn(*mut c_void) -> *mut GList,
    g_list_free:                    unsafe extern "C" fn(*mut GList),
    gtk_widget_get_visible:         unsafe extern "C" fn(*mut c_void) -> c_int,
    gtk_label_get_label:            unsafe extern "C" fn(*mut c_void) -> *const c_char,
    gtk_image_get_storage_type:     unsafe extern "C" fn(*mut c_void) -> c_int,
    gtk_image_get_pixbuf:           unsafe extern "C" fn(*mut c_void) -> *mut c_void,
    gtk_image_get_icon_name:        unsafe extern "C" fn(*mut c_void, *mut *const c_char, *mut c_int),
    gdk_pixbuf_get_width:           unsafe extern "C" fn(*mut c_void) -> c_int,
    gdk_pixbuf_get_height:          unsafe extern "C" fn(*mut c_void) -> c_int,
    gdk_pixbuf_get_rowstride:       unsafe extern "C" fn(*mut c_void) -> c_int,
    gdk_pixbuf_get_n_channels:      unsafe extern "C" fn(*mut c_void) -> c_int,
    gdk_pixbuf_get_pixels:          unsafe extern "C" fn(*mut c_void) -> *const u8,
    gtk_events_pending:             unsafe extern "C" fn() -> c_int,
    gtk_main_iteration_do:          unsafe extern "C" fn(c_int) -> c_int,
    gtk_menu_popup: unsafe extern "C" fn(*mut c_void, *mut c_void, *mut c_void, MenuPositionFn, *mut c_void, c_uint, u32),
    gtk_menu_popdown:               unsafe extern "C" fn(*mut c_void),
}

/// Copy a function pointer out of `lib`.
///
/// # Safety
/// `T` must match the C signature of `name`.
unsafe fn symbol<T: Copy>(lib: &Library, name: &str) -> Result<T> {
    lib.get::<T>(name.as_bytes())
        .map(|s| *s)
        .map_err(|e| PanelError::bridge(ID, format!("{name}: {e}")))
}

fn open_library(name: &str) -> Result<Library> {
    // SAFETY: loading runs the library's initialisers; these are the system
    // GTK 2 stack and libindicator, which have no load-time side effects
    // beyond type registration.
    unsafe { Library::new(name) }.map_err(|e| PanelError::bridge(ID, format!("{name}: {e}")))
}

/// The real thing: libindicator plugins running inside this process.
pub struct NativeBridge {
    api:     Api,
    objects: Vec<*mut c_void>,
    last:    Vec<IndicatorEntry>,
    // Keep the libraries mapped for as long as `api` is alive.
    _libs:   [Library; 3],
}

impl NativeBridge {
    /// Load GTK 2, gdk-pixbuf and libindicator and initialise GTK.
    pub fn open(config: &IndicatorConfig) -> Result<Self> {
        let gtk = open_library(&config.libgtk)?;
        let pixbuf = open_library(&config.libgdk_pixbuf)?;
        let indicator = open_library(&config.libindicator)?;

        // SAFETY: every signature below is the documented GTK 2 /
        // gdk-pixbuf 2 / libindicator 0.4 prototype.
        let api = unsafe {
            Api {
                gtk_init_check:                 symbol(&gtk, "gtk_init_check")?,
                indicator_object_new_from_file: symbol(&indicator, "indicator_object_new_from_file")?,
                indicator_object_get_entries:   symbol(&indicator, "indicator_object_get_entries")?,
                g_list_free:                    symbol(&gtk, "g_list_free")?,
                gtk_widget_get_visible:         symbol(&gtk, "gtk_widget_get_visible")?,
                gtk_label_get_label:            symbol(&gtk, "gtk_label_get_label")?,
                gtk_image_get_storage_type:     symbol(&gtk, "gtk_image_get_storage_type")?,
                gtk_image_get_pixbuf:           symbol(&gtk, "gtk_image_get_pixbuf")?,
                gtk_image_get_icon_name:        symbol(&gtk, "gtk_image_get_icon_name")?,
                gdk_pixbuf_get_width:           symbol(&pixbuf, "gdk_pixbuf_get_width")?,
                gdk_pixbuf_get_height:          symbol(&pixbuf, "gdk_pixbuf_get_height")?,
                gdk_pixbuf_get_rowstride:       symbol(&pixbuf, "gdk_pixbuf_get_rowstride")?,
                gdk_pixbuf_get_n_channels:      symbol(&pixbuf, "gdk_pixbuf_get_n_channels")?,
                gdk_pixbuf_get_pixels:          symbol(&pixbuf, "gdk_pixbuf_get_pixels")?,
                gtk_events_pending:             symbol(&gtk, "gtk_events_pending")?,
                gtk_main_iteration_do:          symbol(&gtk, "gtk_main_iteration_do")?,
                gtk_menu_popup:                 symbol(&gtk, "gtk_menu_popup")?,
                gtk_menu_popdown:               symbol(&gtk, "gtk_menu_popdown")?,
            }
        };

        // SAFETY: null argc/argv is explicitly allowed.
        if unsafe { (api.gtk_init_check)(std::ptr::null_mut(), std::ptr::null_mut()) } == 0 {
            return Err(PanelError::bridge(ID, "gtk_init_check failed (no X display?)"));
        }

        Ok(Self {
            api,
            objects: Vec::new(),
            last: Vec::new(),
            _libs: [gtk, pixbuf, indicator],
        })
    }

    /// Raw entries of every object, in order.  The list nodes are freed
    /// before returning; the entries themselves belong to their object.
    fn raw_entries(&self) -> Vec<*const RawEntry> {
        let mut out = Vec::new();
        for &object in &self.objects {
            // SAFETY: `object` is a live IndicatorObject; the returned list is
            // ours to free, its data is not.
            unsafe {
                let list = (self.api.indicator_object_get_entries)(object);
                let mut node = list;
                while !node.is_null() {
                    let data = (*node).data as *const RawEntry;
                    if !data.is_null() {
                        out.push(data);
                    }
                    node = (*node).next;
                }
                if !list.is_null() {
                    (self.api.g_list_free)(list);
                }
            }
        }
        out
    }

    fn find(&self, key: EntryKey) -> Option<*const RawEntry> {
        self.raw_entries().into_iter().find(|&e| e as EntryKey == key)
    }

    fn visible(&self, widget: *mut c_void) -> bool {
        // SAFETY: `widget` is a non-null GtkWidget owned by its entry.
        !widget.is_null() && unsafe { (self.api.gtk_widget_get_visible)(widget) } != 0
    }

    fn read_entry(&self, raw: *const RawEntry) -> IndicatorEntry {
        // SAFETY: `raw` came from `raw_entries` during this call.
        let raw = unsafe { &*raw };

        let label = self.visible(raw.label).then(|| {
            // SAFETY: label is a visible GtkLabel; the string stays owned by it.
            let text = unsafe { (self.api.gtk_label_get_label)(raw.label) };
            (!text.is_null()).then(|| unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned())
        });

        let image = if self.visible(raw.image) { self.read_image(raw.image) } else { None };

        IndicatorEntry {
            key: raw as *const RawEntry as EntryKey,
            label: label.flatten().filter(|l| !l.is_empty()),
            image,
        }
    }

    fn read_image(&self, image: *mut c_void) -> Option<EntryImage> {
        // SAFETY: `image` is a visible GtkImage.
        unsafe {
            match (self.api.gtk_image_get_storage_type)(image) {
                GTK_IMAGE_PIXBUF => {
                    let pixbuf = (self.api.gtk_image_get_pixbuf)(image);
                    (!pixbuf.is_null()).then(|| EntryImage::Pixels(self.copy_pixbuf(pixbuf)))
                }
                GTK_IMAGE_ICON_NAME => {
                    let mut name: *const c_char = std::ptr::null();
                    (self.api.gtk_image_get_icon_name)(image, &mut name, std::ptr::null_mut());
                    (!name.is_null())
                        .then(|| EntryImage::Named(CStr::from_ptr(name).to_string_lossy().into_owned()))
                }
                other => {
                    debug!("Unsupported GtkImage storage type {other}");
                    None
                }
            }
        }
    }

    /// Copy a GdkPixbuf into tightly packed RGBA.
    ///
    /// # Safety
    /// `pixbuf` must be a live GdkPixbuf.
    unsafe fn copy_pixbuf(&self, pixbuf: *mut c_void) -> Pixmap {
        let width = (self.api.gdk_pixbuf_get_width)(pixbuf).max(0) as usize;
        let height = (self.api.gdk_pixbuf_get_height)(pixbuf).max(0) as usize;
        let stride = (self.api.gdk_pixbuf_get_rowstride)(pixbuf).max(0) as usize;
        let channels = (self.api.gdk_pixbuf_get_n_channels)(pixbuf).clamp(3, 4) as usize;
        let pixels = (self.api.gdk_pixbuf_get_pixels)(pixbuf);

        let mut rgba = Vec::with_capacity(width * height * 4);
        if !pixels.is_null() && height > 0 {
            // The last row is not padded to the full stride.
            let len = stride * (height - 1) + width * channels;
            let data = std::slice::from_raw_parts(pixels, len);
            rgba.extend(packed_rgba(data, width, height, stride, channels));
        }

        Pixmap {
            width: width as u32,
            height: height as u32,
            rgba: rgba.into(),
        }
    }
}

/// Strip row padding and add an opaque alpha channel to RGB data.
fn packed_rgba(
    data: &[u8],
    width: usize,
    height: usize,
    stride: usize,
    channels: usize,
) -> impl Iterator<Item = u8> + '_ {
    (0..height).flat_map(move |row| {
        data[row * stride..row * stride + width * channels]
            .chunks_exact(channels)
            .flat_map(move |px| [px[0], px[1], px[2], if channels == 4 { px[3] } else { 0xff }])
    })
}

impl IndicatorBridge for NativeBridge {
    fn load(&mut self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(PanelError::bridge(ID, format!("{} does not exist", path.display())));
        }
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| PanelError::bridge(ID, e))?;

        // SAFETY: `c_path` is a valid NUL-terminated string.
        let object = unsafe { (self.api.indicator_object_new_from_file)(c_path.as_ptr()) };
        if object.is_null() {
            return Err(PanelError::bridge(ID, format!("{} is not an indicator", path.display())));
        }

        self.objects.push(object);
        self.last = self.entries();
        Ok(())
    }

    fn entries(&self) -> Vec<IndicatorEntry> {
        self.raw_entries()
            .into_iter()
            .map(|raw| self.read_entry(raw))
            .filter(|e| e.label.is_some() || e.image.is_some())
            .collect()
    }

    fn pump(&mut self) -> bool {
        // SAFETY: GTK was initialised in `open` and is only used from this thread.
        unsafe {
            let mut handled = 0;
            while handled < MAX_EVENTS_PER_PUMP && (self.api.gtk_events_pending)() != 0 {
                (self.api.gtk_main_iteration_do)(0);
                handled += 1;
            }
        }

        let current = self.entries();
        if current == self.last {
            return false;
        }
        self.last = current;
        true
    }

    fn popup(&mut self, entry: EntryKey) -> Result<()> {
        let raw = self
            .find(entry)
            .ok_or_else(|| PanelError::bridge(ID, format!("entry {entry:#x} is gone")))?;

        // SAFETY: `raw` is a live entry; its menu, if any, is a GtkMenu.
        unsafe {
            let menu = (*raw).menu;
            if menu.is_null() {
                return Err(PanelError::bridge(ID, "entry has no menu"));
            }
            (self.api.gtk_menu_popup)(
                menu,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                None,
                std::ptr::null_mut(),
                1,
                0,
            );
        }
        Ok(())
    }

    fn hide(&mut self, entry: EntryKey) {
        let Some(raw) = self.find(entry) else {
            warn!("Indicator entry {entry:#x} vanished with its menu open");
            return;
        };
        // SAFETY: as in `popup`.
        unsafe {
            let menu = (*raw).menu;
            if !menu.is_null() {
                (self.api.gtk_menu_popdown)(menu);
            }
        }
    }
}

impl std::fmt::Debug for NativeBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeBridge")
            .field("objects", &self.objects.len())
            .field("entries", &self.last.len())
            .finish()
    }
}
